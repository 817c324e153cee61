use crate::error::{FolioError, FolioResult};

/// Build the URL- and filename-safe key for a title.
///
/// Non-ASCII characters are transliterated first, every run of other
/// characters collapses into a single `-`, and the result is lowercase with
/// no leading or trailing dash.
pub fn slugify(title: &str) -> FolioResult<String> {
    slugify_as("title", title)
}

/// Same as [`slugify`], naming `what` in the error (e.g. `"tag"`).
pub fn slugify_as(what: &'static str, input: &str) -> FolioResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut need_dash = false;
    for ch in input.chars() {
        for b in deunicode::deunicode_char(ch).unwrap_or("-").bytes() {
            if b.is_ascii_alphanumeric() {
                if need_dash {
                    out.push('-');
                    need_dash = false;
                }
                out.push(b.to_ascii_lowercase() as char);
            } else {
                need_dash = !out.is_empty();
            }
        }
    }

    if out.is_empty() {
        return Err(FolioError::EmptyTitle {
            what,
            input: input.to_string(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_sanitization_is_stable() {
        assert_eq!(slugify("Haze Walkthrough").unwrap(), "haze-walkthrough");
        assert_eq!(
            slugify("Haze Walkthrough").unwrap(),
            slugify("Haze Walkthrough").unwrap()
        );
        assert_eq!(slugify("  HTB: Nocturnal (v2.0)  ").unwrap(), "htb-nocturnal-v2-0");
        assert_eq!(slugify("abc___def").unwrap(), "abc-def");
    }

    #[test]
    fn distinct_titles_get_distinct_slugs() {
        assert_ne!(slugify("A").unwrap(), slugify("B").unwrap());
    }

    #[test]
    fn colliding_titles_share_a_slug() {
        assert_eq!(slugify("Haze!").unwrap(), slugify("haze").unwrap());
    }

    #[test]
    fn non_ascii_is_transliterated() {
        assert_eq!(slugify("Café Ünïcode").unwrap(), "cafe-unicode");
    }

    #[test]
    fn symbol_only_titles_are_rejected() {
        let err = slugify("!!! ---").unwrap_err();
        assert!(matches!(err, FolioError::EmptyTitle { what: "title", .. }));
        assert!(slugify_as("tag", "   ").is_err());
    }
}
