//! `$name` substitution over the argument text

use crate::environment::Environment;

/// Replace `$name` references with their values, left to right.
///
/// `\$` becomes a literal `$`; any other `\x` pair is kept untouched so the
/// tokenizer still sees it. Undefined names are left as written.
pub fn substitute(text: &str, env: &Environment) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('$') => result.push('$'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            },
            '$' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if !next.is_alphanumeric() {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                match env.get(&name) {
                    Some(value) if !name.is_empty() => result.push_str(value),
                    _ => {
                        result.push('$');
                        result.push_str(&name);
                    }
                }
            }
            _ => result.push(c),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &[(&str, &str)]) -> Environment {
        let mut env = Environment::new();
        for (k, v) in pairs {
            env.set(*k, *v);
        }
        env
    }

    #[test]
    fn test_defined_variable() {
        let env = env_with(&[("x", "5")]);
        assert_eq!(substitute("$x", &env), "5");
        assert_eq!(substitute("a $x b", &env), "a 5 b");
        assert_eq!(substitute("$x$x", &env), "55");
    }

    #[test]
    fn test_undefined_stays_literal() {
        let env = Environment::new();
        assert_eq!(substitute("$x", &env), "$x");
        assert_eq!(substitute("cost $", &env), "cost $");
    }

    #[test]
    fn test_name_ends_at_non_alphanumeric() {
        let env = env_with(&[("dir", "/tmp")]);
        assert_eq!(substitute("$dir/file", &env), "/tmp/file");
        assert_eq!(substitute("$dirx", &env), "$dirx");
    }

    #[test]
    fn test_escapes() {
        let env = env_with(&[("x", "5")]);
        assert_eq!(substitute(r"\$x", &env), "$x");
        assert_eq!(substitute(r#"\"$x\""#, &env), r#"\"5\""#);
        assert_eq!(substitute(r"trailing\", &env), r"trailing\");
    }
}
