//! Type checker: a per-procedure stack simulation with a
//! block automaton over `if`/`elif`/`while`/`do`/`else`/`end`.
//!
//! The automaton is driven by a stack of tagged `(marker, snapshot)`
//! frames, kept here as [`BlockFrame`] rather
//! than overloading the cross-referencer's jump-index stack. Two
//! behaviors are redesigns over the source's own partial implementation,
//! per the resolutions this specification adopts: an `elif` whose
//! condition disturbs the stack is a `TypeError`, not silently accepted,
//! and `while` is fully typechecked (condition, body, and back-edge all
//! required to agree).

use collver_par::{DataType, Keyword, Proc, ProcTypeSig, Program, TypeAnnotation, Word};
use collver_util::{CollverError, CollverResult, Diagnostic, Handler, Location};

type ValueStack = Vec<TypeAnnotation>;

/// A still-open `if`/`elif`/.../`end` chain.
struct IfChain {
    /// Stack shared by every alternative: the value stack immediately
    /// after `do` pops that branch's condition.
    group_entry: ValueStack,
    /// Exit stack of each branch closed so far (recorded at the `elif`,
    /// `else`, or `end` that follows it).
    branch_exits: Vec<ValueStack>,
    has_else: bool,
    if_location: Location,
    /// `true` once the chain's own `do` snapshot has been taken; before
    /// that, a marker sits on the stack but `group_entry` is not yet
    /// meaningful.
    awaiting_do: bool,
}

struct WhileChain {
    stack_at_while: ValueStack,
    while_location: Location,
}

enum BlockFrame {
    If(IfChain),
    Elif,
    While(WhileChain),
}

pub fn check_program(program: &Program) -> CollverResult<Handler> {
    let mut handler = Handler::new();
    for proc in program.procs.values() {
        check_proc(program, proc, &mut handler)?;
    }
    Ok(handler)
}

fn check_proc(program: &Program, proc: &Proc, handler: &mut Handler) -> CollverResult<()> {
    let mut stack: ValueStack = proc.sig.args.clone();
    let mut blocks: Vec<BlockFrame> = Vec::new();

    for word in &proc.words {
        match word {
            Word::PushInt { token, .. } => stack.push(TypeAnnotation::new(DataType::Int, token.location())),
            Word::PushString { token, .. } => stack.push(TypeAnnotation::new(DataType::Str, token.location())),
            Word::PushMemory { token, .. } => stack.push(TypeAnnotation::new(DataType::Ptr, token.location())),
            Word::ProcCall { name, token } => {
                if let Some(callee) = program.procs.get(name) {
                    apply_call(&mut stack, &callee.sig, token.location())?;
                } else if let Some(overloads) = program.externs.get(name) {
                    apply_extern_call(&mut stack, overloads, token.location())?;
                } else {
                    handler.warning(
                        format!("call to unknown procedure `{}`", token_text(token)),
                        token.location(),
                    );
                    return Ok(());
                }
            }
            Word::Keyword { keyword, token, .. } => {
                drive_automaton(*keyword, token.location(), &mut stack, &mut blocks)?;
            }
            Word::DataType { token, .. } | Word::MemoryName { token, .. } | Word::ProcName { token, .. } => {
                return Err(CollverError::Type(Diagnostic::error(
                    "this token cannot appear inside a procedure body",
                    token.location(),
                )));
            }
        }
    }

    if !blocks.is_empty() {
        let loc = match blocks.last().unwrap() {
            BlockFrame::If(chain) => chain.if_location,
            BlockFrame::Elif => proc.location,
            BlockFrame::While(w) => w.while_location,
        };
        return Err(CollverError::Structure(Diagnostic::error("unclosed block", loc)));
    }

    check_return_shape(&stack, &proc.sig)
}

fn token_text(token: &collver_lex::Token) -> String {
    match token {
        collver_lex::Token::Word(text, _) => text.clone(),
        _ => String::new(),
    }
}

fn pop_condition(stack: &mut ValueStack, loc: Location) -> CollverResult<()> {
    match stack.pop() {
        Some(top) if top.data_type == DataType::Int => Ok(()),
        Some(top) => Err(CollverError::Type(Diagnostic::error(
            format!("branch condition must be `int`, found `{}`", top.data_type),
            loc,
        )
        .with_note("value pushed here", top.location))),
        None => Err(CollverError::Type(Diagnostic::error(
            "branch condition expected, but the stack is empty",
            loc,
        ))),
    }
}

fn drive_automaton(
    keyword: Keyword,
    loc: Location,
    stack: &mut ValueStack,
    blocks: &mut Vec<BlockFrame>,
) -> CollverResult<()> {
    match keyword {
        Keyword::If => {
            blocks.push(BlockFrame::If(IfChain {
                group_entry: Vec::new(),
                branch_exits: Vec::new(),
                has_else: false,
                if_location: loc,
                awaiting_do: true,
            }));
            Ok(())
        }
        Keyword::While => {
            blocks.push(BlockFrame::While(WhileChain {
                stack_at_while: stack.clone(),
                while_location: loc,
            }));
            Ok(())
        }
        Keyword::Do => match blocks.last_mut() {
            Some(BlockFrame::If(chain)) if chain.awaiting_do => {
                pop_condition(stack, loc)?;
                chain.group_entry = stack.clone();
                chain.awaiting_do = false;
                Ok(())
            }
            Some(BlockFrame::Elif) => {
                blocks.pop();
                pop_condition(stack, loc)?;
                let Some(BlockFrame::If(chain)) = blocks.last() else {
                    unreachable!("Elif frame always sits above its owning If frame")
                };
                if !stacks_equal(stack, &chain.group_entry) {
                    return Err(mismatch_error(
                        "`elif` condition must not change the stack shape",
                        stack,
                        &chain.group_entry,
                    ));
                }
                Ok(())
            }
            Some(BlockFrame::While(w)) => {
                let expected = w.stack_at_while.clone();
                pop_condition(stack, loc)?;
                if !stacks_equal(stack, &expected) {
                    return Err(mismatch_error(
                        "`while` condition must not change the stack shape",
                        stack,
                        &expected,
                    ));
                }
                Ok(())
            }
            _ => Err(CollverError::Structure(Diagnostic::error(
                "`do` without a matching `if`, `elif`, or `while`",
                loc,
            ))),
        },
        Keyword::Elif => {
            let Some(BlockFrame::If(chain)) = blocks.last_mut() else {
                return Err(CollverError::Structure(Diagnostic::error(
                    "`elif` without a matching `if`",
                    loc,
                )));
            };
            chain.branch_exits.push(std::mem::take(stack));
            *stack = chain.group_entry.clone();
            blocks.push(BlockFrame::Elif);
            Ok(())
        }
        Keyword::Else => {
            let Some(BlockFrame::If(chain)) = blocks.last_mut() else {
                return Err(CollverError::Structure(Diagnostic::error(
                    "`else` without a matching `if`",
                    loc,
                )));
            };
            chain.branch_exits.push(std::mem::take(stack));
            *stack = chain.group_entry.clone();
            chain.has_else = true;
            Ok(())
        }
        Keyword::End => match blocks.pop() {
            Some(BlockFrame::If(mut chain)) => {
                chain.branch_exits.push(std::mem::take(stack));
                let baseline = if chain.has_else {
                    chain.branch_exits[0].clone()
                } else {
                    chain.group_entry.clone()
                };
                for exit in &chain.branch_exits {
                    if !stacks_equal(exit, &baseline) {
                        return Err(mismatch_error(
                            if chain.has_else {
                                "every branch must leave the stack in the same shape"
                            } else {
                                "a conditional without `else` may not change the stack"
                            },
                            exit,
                            &baseline,
                        ));
                    }
                }
                *stack = baseline;
                Ok(())
            }
            Some(BlockFrame::While(w)) => {
                if !stacks_equal(stack, &w.stack_at_while) {
                    return Err(mismatch_error(
                        "a `while` body may not change the stack shape",
                        stack,
                        &w.stack_at_while,
                    ));
                }
                Ok(())
            }
            Some(BlockFrame::Elif) => Err(CollverError::Structure(Diagnostic::error(
                "unclosed `elif`: expected `do`",
                loc,
            ))),
            None => Err(CollverError::Structure(Diagnostic::error(
                "`end` without a matching `if` or `while`",
                loc,
            ))),
        },
        Keyword::Memory | Keyword::Proc | Keyword::Extern | Keyword::Arrow => Err(
            CollverError::Type(Diagnostic::error("this keyword cannot appear inside a body", loc)),
        ),
    }
}

fn stacks_equal(a: &[TypeAnnotation], b: &[TypeAnnotation]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.data_type == y.data_type)
}

fn mismatch_error(message: &str, got: &[TypeAnnotation], expected: &[TypeAnnotation]) -> CollverError {
    let loc = divergence_location(got, expected);
    CollverError::Type(Diagnostic::error(message, loc))
}

/// The location of the first element where `got` and `expected` diverge,
/// or the location introducing the first surplus/missing element.
fn divergence_location(got: &[TypeAnnotation], expected: &[TypeAnnotation]) -> Location {
    for (a, b) in got.iter().zip(expected) {
        if a.data_type != b.data_type {
            return a.location;
        }
    }
    got.last().or(expected.last()).map(|a| a.location).unwrap_or(Location::DUMMY)
}

fn apply_call(stack: &mut ValueStack, sig: &ProcTypeSig, call_loc: Location) -> CollverResult<()> {
    match try_apply(stack, sig, call_loc) {
        Some(new_stack) => {
            *stack = new_stack;
            Ok(())
        }
        None => Err(CollverError::Type(
            Diagnostic::error("call does not match the procedure's argument types", call_loc)
                .with_note("signature declared here", sig.arrow_location),
        )),
    }
}

fn apply_extern_call(
    stack: &mut ValueStack,
    overloads: &[ProcTypeSig],
    call_loc: Location,
) -> CollverResult<()> {
    for sig in overloads {
        if let Some(new_stack) = try_apply(stack, sig, call_loc) {
            *stack = new_stack;
            return Ok(());
        }
    }
    let mut diag = Diagnostic::error("no overload of this extern matches the arguments", call_loc);
    for sig in overloads {
        diag = diag.with_note("candidate signature defined here", sig.arrow_location);
    }
    Err(CollverError::Type(diag))
}

/// Try applying one signature: the tail of `stack` must exactly match
/// `sig.args`. On success, returns the stack with the arguments popped
/// and the returns pushed, annotated at the call site rather than at
/// the signature's own declaration.
fn try_apply(stack: &ValueStack, sig: &ProcTypeSig, call_loc: Location) -> Option<ValueStack> {
    if stack.len() < sig.args.len() {
        return None;
    }
    let split = stack.len() - sig.args.len();
    let tail = &stack[split..];
    if !tail.iter().zip(&sig.args).all(|(s, a)| s.data_type == a.data_type) {
        return None;
    }
    let mut new_stack = stack[..split].to_vec();
    for ret in &sig.returns {
        new_stack.push(TypeAnnotation::new(ret.data_type, call_loc));
    }
    Some(new_stack)
}

fn check_return_shape(stack: &[TypeAnnotation], sig: &ProcTypeSig) -> CollverResult<()> {
    if stacks_equal(stack, &sig.returns) {
        return Ok(());
    }
    let loc = stack
        .get(sig.returns.len())
        .map(|a| a.location)
        .unwrap_or_else(|| divergence_location(stack, &sig.returns));
    Err(CollverError::Type(
        Diagnostic::error(
            format!(
                "procedure's final stack ({} item(s)) does not match its declared returns ({} item(s))",
                stack.len(),
                sig.returns.len()
            ),
            loc,
        )
        .with_note("return types declared here", sig.arrow_location),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use collver_lex::lex;
    use collver_par::{parse_program, parse_words};
    use collver_util::Symbol;

    fn checked(src: &str) -> CollverResult<Handler> {
        let tokens = lex("t.collver", src).unwrap();
        let words = parse_words(tokens).unwrap();
        let program = parse_program(Symbol::intern("t.collver"), words).unwrap();
        check_program(&program)
    }

    #[test]
    fn straight_line_code_typechecks() {
        let src = "extern drop_int int -> end\nextern drop_ptr ptr -> end\n\
                   proc main int ptr -> int do drop_int drop_ptr 0 end";
        let handler = checked(src).unwrap();
        assert!(handler.is_empty());
    }

    /// Straight-line soundness: the final stack
    /// is exactly the seeded arguments concatenated with each word's own
    /// effect, with nothing dropped.
    #[test]
    fn arguments_remain_on_the_stack_until_consumed() {
        let err = checked("proc main int ptr -> int do 0 end").unwrap_err();
        assert!(matches!(err, CollverError::Type(_)));
    }

    #[test]
    fn branch_without_else_may_not_change_stack() {
        let err = checked("proc f int -> int do if 1 do 2 end end").unwrap_err();
        assert!(matches!(err, CollverError::Type(_)));
    }

    #[test]
    fn matching_branch_shapes_with_else_typecheck() {
        let src = "extern drop int -> end\nproc f int -> int do if 1 do drop 5 else drop 9 end end";
        let handler = checked(src).unwrap();
        assert!(handler.is_empty());
    }

    #[test]
    fn mismatched_else_branch_is_a_type_error() {
        let src = "extern drop int -> end\nproc f int -> int do if 1 do 2 else drop drop end end";
        let err = checked(src).unwrap_err();
        assert!(matches!(err, CollverError::Type(_)));
    }

    #[test]
    fn extern_overload_resolution_picks_matching_signature() {
        let src = "extern add int int -> int end\nextern add ptr int -> ptr end\nproc f ptr int -> ptr do add end";
        let handler = checked(src).unwrap();
        assert!(handler.is_empty());
    }

    /// The word parser only ever emits `ProcCall` for a pre-registered
    /// proc/extern name, so this path is unreachable through the public
    /// front end with this word parser's single-pass registration; it is
    /// exercised directly against a hand-built AST for spec fidelity.
    #[test]
    fn unknown_call_is_a_warning_not_a_fatal_error() {
        use collver_lex::Token;
        use collver_par::{Proc, ProcTypeSig, Program};
        use indexmap::IndexMap;

        let loc = Location::new(Symbol::intern("t.collver"), 0, 0);
        let token = Token::Word("nonexistent".into(), loc);
        let proc = Proc {
            location: loc,
            local_memories: IndexMap::new(),
            sig: ProcTypeSig { args: vec![], returns: vec![], arrow_location: loc },
            strings: IndexMap::new(),
            words: vec![Word::ProcCall { name: Symbol::intern("nonexistent"), token }],
        };
        let mut procs = IndexMap::new();
        procs.insert(Symbol::intern("f"), proc);
        let program = Program {
            source_path: Symbol::intern("t.collver"),
            procs,
            externs: IndexMap::new(),
            global_memories: IndexMap::new(),
        };

        let handler = check_program(&program).unwrap();
        assert_eq!(handler.diagnostics().len(), 1);
    }

    #[test]
    fn while_requires_matching_entry_body_and_condition_shapes() {
        let src = "extern drop int -> end\nproc f int -> do while 1 do drop end end";
        let err = checked(src).unwrap_err();
        assert!(matches!(err, CollverError::Type(_)));
    }

    #[test]
    fn while_with_stable_shape_typechecks() {
        let src = "extern noop -> end\nproc f -> do while 1 do noop end end";
        let handler = checked(src).unwrap();
        assert!(handler.is_empty());
    }
}
