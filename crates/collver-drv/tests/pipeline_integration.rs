//! End-to-end pipeline tests exercising the seed scenarios: each one
//! runs the whole front end over a literal source string and checks the
//! documented outcome.

use collver_drv::{compile_source, DriverConfig};
use collver_util::{CollverError, Symbol};

fn compile(src: &str) -> collver_util::CollverResult<collver_drv::CompiledUnit> {
    compile_source("seed.collver", src, &DriverConfig::default())
}

#[test]
fn declared_arguments_stay_on_the_stack_until_a_word_consumes_them() {
    // `proc main int ptr -> int do 0 end` leaves the seeded `int ptr`
    // args plus the pushed `0` on the stack: three values against a
    // declared single-int return, a type error rather than the
    // type-checking success a looser reading of the return rule might
    // suggest.
    let err = compile("proc main int ptr -> int do 0 end").unwrap_err();
    assert!(matches!(err, CollverError::Type(_)));
}

#[test]
fn consuming_the_arguments_first_lets_the_same_shape_typecheck() {
    let src = "extern drop_int int -> end\n\
               extern drop_ptr ptr -> end\n\
               proc main int ptr -> int do drop_ptr drop_int 0 end";
    let unit = compile(src).unwrap();
    assert!(unit.warnings.is_empty());
    assert!(unit.program.procs.contains_key(&Symbol::intern("main")));
}

#[test]
fn branch_equivalence_error() {
    let src = "extern drop int -> end\n\
               proc f int -> int do if 1 do 2 else drop drop end end";
    let err = compile(src).unwrap_err();
    assert!(matches!(err, CollverError::Type(_)));
}

#[test]
fn extern_overload_resolution_picks_the_matching_signature() {
    let src = "extern add int int -> int end\n\
               extern add ptr int -> ptr end\n\
               proc f ptr int -> ptr do add end";
    let unit = compile(src).unwrap();
    assert!(unit.warnings.is_empty());
    let f = &unit.program.procs[&Symbol::intern("f")];
    assert_eq!(f.sig.returns.len(), 1);
}

#[test]
fn unclosed_block_is_a_structure_error() {
    let src = "proc f -> do if 1 do 2 end";
    let err = compile(src).unwrap_err();
    assert!(matches!(err, CollverError::Structure(_)));
    let loc = err.diagnostic().unwrap().location;
    assert_eq!((loc.row, loc.column), (0, 13), "should point at `if`, not `proc f`'s own declaration");
}

#[test]
fn const_rpn_evaluates_before_the_checker_ever_sees_the_name() {
    let src = "const N 2 3 + end\n\
               extern drop_int int -> end\n\
               extern drop_ptr ptr -> end\n\
               proc main int ptr -> int do drop_ptr drop_int N end";
    let unit = compile(src).unwrap();
    assert!(unit.program.procs.contains_key(&Symbol::intern("main")));
}

#[test]
fn repeated_include_only_splices_its_tokens_once() {
    let dir = tempfile::tempdir().unwrap();
    let included = dir.path().join("a.collver");
    std::fs::write(&included, "extern noop -> end\n").unwrap();

    let src = format!(
        "include \"{0}\"\ninclude \"{0}\"\nproc f -> do noop end",
        included.display()
    );
    let unit = compile_source("seed.collver", &src, &DriverConfig::default()).unwrap();
    assert_eq!(unit.program.externs[&Symbol::intern("noop")].len(), 1);
}
