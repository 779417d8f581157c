//! Include expansion: replaces `include "<path>"` pairs
//! with the lexed contents of the referenced file, CWD first then the
//! configured `std/` search directories, each physical path spliced in at
//! most once.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use collver_lex::{lex, Token};
use collver_util::{CollverError, CollverResult, Diagnostic};

/// Where to look for include targets that don't resolve relative to the
/// current directory.
#[derive(Clone, Debug, Default)]
pub struct PreprocessConfig {
    pub include_dirs: Vec<PathBuf>,
}

/// Expand every `include` directive in `tokens`, recursively expanding the
/// includes of included files too. A path already spliced in earlier in
/// the same compilation is silently dropped on a later reference.
pub fn expand_includes(
    tokens: Vec<Token>,
    config: &PreprocessConfig,
) -> CollverResult<Vec<Token>> {
    let mut included = HashSet::new();
    expand(tokens, config, &mut included)
}

fn expand(
    tokens: Vec<Token>,
    config: &PreprocessConfig,
    included: &mut HashSet<PathBuf>,
) -> CollverResult<Vec<Token>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        let is_include = matches!(&token, Token::Word(text, _) if text == "include");
        if !is_include {
            out.push(token);
            continue;
        }

        let path_token = iter.next().ok_or_else(|| {
            CollverError::Preprocess(Diagnostic::error(
                "`include` must be followed by a string path",
                token.location(),
            ))
        })?;
        let Token::Str(path_text, _) = &path_token else {
            return Err(CollverError::Preprocess(Diagnostic::error(
                "`include` must be followed by a string path",
                path_token.location(),
            )));
        };

        let resolved = resolve_include(path_text, config).ok_or_else(|| {
            CollverError::Preprocess(Diagnostic::error(
                format!("cannot find include target `{path_text}`"),
                path_token.location(),
            ))
        })?;

        let canonical = resolved.canonicalize().unwrap_or(resolved.clone());
        if included.contains(&canonical) {
            log::debug!("include `{}` already resolved, skipping", canonical.display());
            continue;
        }
        included.insert(canonical.clone());
        log::debug!("expanding include `{}`", canonical.display());

        let source = fs::read_to_string(&resolved).map_err(|source| CollverError::Io {
            path: resolved.display().to_string(),
            source,
        })?;
        let file_tokens = lex(&resolved.display().to_string(), &source)?;
        let expanded = expand(file_tokens, config, included)?;
        out.extend(expanded);
    }

    Ok(out)
}

fn resolve_include(path_text: &str, config: &PreprocessConfig) -> Option<PathBuf> {
    let cwd_candidate = Path::new(path_text);
    if cwd_candidate.is_file() {
        return Some(cwd_candidate.to_path_buf());
    }
    for dir in &config.include_dirs {
        let candidate = dir.join(path_text);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lex_str(src: &str) -> Vec<Token> {
        lex("entry.collver", src).unwrap()
    }

    #[test]
    fn duplicate_includes_expand_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let a_path = dir.path().join("a.collver");
        let mut f = fs::File::create(&a_path).unwrap();
        writeln!(f, "42").unwrap();

        let src = format!(
            "include \"{0}\"\ninclude \"{0}\"",
            a_path.display().to_string().replace('\\', "\\\\")
        );
        let tokens = lex_str(&src);
        let config = PreprocessConfig::default();
        let expanded = expand_includes(tokens, &config).unwrap();
        let int_count = expanded.iter().filter(|t| matches!(t, Token::Int(42, _))).count();
        assert_eq!(int_count, 1);
    }

    #[test]
    fn missing_include_target_is_an_error() {
        let tokens = lex_str("include \"definitely-missing.collver\"");
        let err = expand_includes(tokens, &PreprocessConfig::default()).unwrap_err();
        assert!(matches!(err, CollverError::Preprocess(_)));
    }

    #[test]
    fn non_string_operand_is_an_error() {
        let tokens = lex_str("include 5");
        let err = expand_includes(tokens, &PreprocessConfig::default()).unwrap_err();
        assert!(matches!(err, CollverError::Preprocess(_)));
    }

    #[test]
    fn std_dir_is_searched_when_cwd_misses() {
        let dir = tempfile::tempdir().unwrap();
        let std_path = dir.path().join("core.collver");
        fs::write(&std_path, "7").unwrap();

        let tokens = lex_str("include \"core.collver\"");
        let config = PreprocessConfig { include_dirs: vec![dir.path().to_path_buf()] };
        let expanded = expand_includes(tokens, &config).unwrap();
        assert!(expanded.iter().any(|t| matches!(t, Token::Int(7, _))));
    }

    #[quickcheck_macros::quickcheck]
    fn repeating_the_same_include_any_number_of_times_expands_it_once(repeats: u8) -> bool {
        let repeats = (repeats % 6) + 1; // 1..=6, keeps the temp-dir churn bounded
        let dir = tempfile::tempdir().unwrap();
        let a_path = dir.path().join("a.collver");
        fs::write(&a_path, "42").unwrap();

        let mut src = String::new();
        for _ in 0..repeats {
            src.push_str(&format!("include \"{}\"\n", a_path.display()));
        }
        let tokens = lex_str(&src);
        let expanded = match expand_includes(tokens, &PreprocessConfig::default()) {
            Ok(expanded) => expanded,
            Err(_) => return false,
        };
        expanded.iter().filter(|t| matches!(t, Token::Int(42, _))).count() == 1
    }
}
