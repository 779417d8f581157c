//! Cross-referencer: fills in every control-flow word's
//! `jmp` index with a single forward scan per procedure.
//!
//! The source's own step-by-step transitions mix self-referential and
//! forward-looking `jmp` targets for `else` in an internally inconsistent way; this
//! calls out as inconsistent. This implements the NORMALIZED outcome the
//! spec names authoritative instead of reproducing that inconsistency:
//! every `do` jumps to the next `elif`/`else`/`end`; every `elif`/`else`
//! jumps to the chain's closing `end`; a `while`'s `end` jumps back to
//! the `while`.

use collver_par::{Keyword, Program, Word};
use collver_util::{CollverError, CollverResult, Diagnostic, Location};

struct IfFrame {
    start_loc: Location,
    /// Index of the most recently opened `do`/`elif`/`else` whose `jmp`
    /// is still unset; resolved to the next pivot's index as soon as one
    /// is found.
    pending_pivot: Option<usize>,
    /// `elif`/`else` indices whose `jmp` resolves to the closing `end`.
    backpatch_to_end: Vec<usize>,
}

struct WhileFrame {
    while_ip: usize,
    while_loc: Location,
    pending_pivot: Option<usize>,
}

enum Frame {
    If(IfFrame),
    While(WhileFrame),
}

pub fn cross_reference_program(program: &mut Program) -> CollverResult<()> {
    for proc in program.procs.values_mut() {
        cross_reference_words(&mut proc.words)?;
    }
    Ok(())
}

fn cross_reference_words(words: &mut [Word]) -> CollverResult<()> {
    let mut frames: Vec<Frame> = Vec::new();

    for ip in 0..words.len() {
        let Some(keyword) = words[ip].as_keyword() else { continue };
        let loc = words[ip].location();

        match keyword {
            Keyword::If => frames.push(Frame::If(IfFrame {
                start_loc: loc,
                pending_pivot: None,
                backpatch_to_end: Vec::new(),
            })),
            Keyword::While => frames.push(Frame::While(WhileFrame {
                while_ip: ip,
                while_loc: loc,
                pending_pivot: None,
            })),
            Keyword::Do => match frames.last_mut() {
                Some(Frame::If(f)) if f.pending_pivot.is_none() => f.pending_pivot = Some(ip),
                Some(Frame::While(f)) if f.pending_pivot.is_none() => f.pending_pivot = Some(ip),
                _ => {
                    return Err(CollverError::Structure(Diagnostic::error(
                        "`do` without a matching `if`, `elif`, or `while`",
                        loc,
                    )))
                }
            },
            Keyword::Elif => {
                let Some(Frame::If(f)) = frames.last_mut() else {
                    return Err(CollverError::Structure(Diagnostic::error(
                        "`elif` without a matching `if`",
                        loc,
                    )));
                };
                if let Some(prev) = f.pending_pivot.take() {
                    set_jmp(words, prev, ip);
                }
                f.backpatch_to_end.push(ip);
            }
            Keyword::Else => {
                let Some(Frame::If(f)) = frames.last_mut() else {
                    return Err(CollverError::Structure(Diagnostic::error(
                        "`else` without a matching `if`",
                        loc,
                    )));
                };
                if let Some(prev) = f.pending_pivot.take() {
                    set_jmp(words, prev, ip);
                }
                f.backpatch_to_end.push(ip);
            }
            Keyword::End => match frames.pop() {
                Some(Frame::If(f)) => {
                    if let Some(prev) = f.pending_pivot {
                        set_jmp(words, prev, ip);
                    }
                    for idx in &f.backpatch_to_end {
                        set_jmp(words, *idx, ip);
                    }
                    set_jmp(words, ip, ip);
                }
                Some(Frame::While(f)) => {
                    if let Some(prev) = f.pending_pivot {
                        set_jmp(words, prev, ip);
                    }
                    set_jmp(words, ip, f.while_ip);
                }
                None => {
                    return Err(CollverError::Structure(Diagnostic::error(
                        "`end` without a matching `if` or `while`",
                        loc,
                    )))
                }
            },
            Keyword::Memory | Keyword::Proc | Keyword::Extern | Keyword::Arrow => {}
        }
    }

    if let Some(frame) = frames.last() {
        let loc = match frame {
            Frame::If(f) => f.start_loc,
            Frame::While(f) => f.while_loc,
        };
        return Err(CollverError::Structure(Diagnostic::error("unclosed block", loc)));
    }

    Ok(())
}

fn set_jmp(words: &mut [Word], at: usize, target: usize) {
    if let Word::Keyword { jmp, .. } = &mut words[at] {
        *jmp = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collver_lex::lex;
    use collver_par::{parse_program, parse_words, Word};
    use collver_util::Symbol;

    fn xref(src: &str) -> Program {
        let tokens = lex("t.collver", src).unwrap();
        let words = parse_words(tokens).unwrap();
        let mut program = parse_program(Symbol::intern("t.collver"), words).unwrap();
        cross_reference_program(&mut program).unwrap();
        program
    }

    fn jmp_of(words: &[Word], keyword: Keyword, occurrence: usize) -> usize {
        words
            .iter()
            .filter(|w| w.as_keyword() == Some(keyword))
            .nth(occurrence)
            .and_then(|w| match w {
                Word::Keyword { jmp, .. } => *jmp,
                _ => None,
            })
            .expect("jmp not set")
    }

    #[test]
    fn every_control_flow_word_has_a_jmp_after_cross_referencing() {
        let program = xref("extern drop int -> end\nproc f int -> do if 1 do drop else drop end end");
        let words = &program.procs[&Symbol::intern("f")].words;
        assert!(words.iter().all(|w| match w {
            Word::Keyword { jmp, .. } => jmp.is_some(),
            _ => true,
        }));
    }

    #[test]
    fn simple_if_do_jumps_to_end() {
        let program = xref("extern drop int -> end\nproc f int -> do if 1 do drop end end");
        let words = &program.procs[&Symbol::intern("f")].words;
        let end_idx = words.iter().position(|w| w.as_keyword() == Some(Keyword::End)).unwrap();
        assert_eq!(jmp_of(words, Keyword::Do, 0), end_idx);
        assert_eq!(jmp_of(words, Keyword::End, 0), end_idx);
    }

    #[test]
    fn while_end_jumps_back_to_while() {
        let program = xref("extern noop -> end\nproc f -> do while 1 do noop end end");
        let words = &program.procs[&Symbol::intern("f")].words;
        let while_idx = words.iter().position(|w| w.as_keyword() == Some(Keyword::While)).unwrap();
        let end_idx = words.iter().position(|w| w.as_keyword() == Some(Keyword::End)).unwrap();
        assert_eq!(jmp_of(words, Keyword::End, 0), while_idx);
        assert_eq!(jmp_of(words, Keyword::Do, 0), end_idx);
    }

    #[test]
    fn elif_and_else_jump_to_closing_end() {
        let src = "extern drop int -> end\nproc f int -> do if 1 do drop elif 1 do drop else drop end end";
        let program = xref(src);
        let words = &program.procs[&Symbol::intern("f")].words;
        let end_idx = words.iter().position(|w| w.as_keyword() == Some(Keyword::End)).unwrap();
        assert_eq!(jmp_of(words, Keyword::Elif, 0), end_idx);
        assert_eq!(jmp_of(words, Keyword::Else, 0), end_idx);
    }

    #[test]
    fn unmatched_else_is_a_structure_error() {
        let tokens = lex("t.collver", "proc f -> do else end").unwrap();
        let words = parse_words(tokens).unwrap();
        let mut program = parse_program(Symbol::intern("t.collver"), words).unwrap();
        let err = cross_reference_program(&mut program).unwrap_err();
        assert!(matches!(err, CollverError::Structure(_)));
    }
}
