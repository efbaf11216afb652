use std::borrow::Cow;

// `&amp;` goes last so an encoded entity is only decoded once.
const ENTITIES: &[(&str, &str)] = &[
    ("&quot;", "\""),
    ("&#34;", "\""),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    ("&apos;", "'"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&nbsp;", " "),
    ("&amp;", "&"),
];

/// Restore HTML-entity artifacts left by the web console in a command line.
///
/// `del &quot;C:\tmp\a.txt&quot;` becomes `del "C:\tmp\a.txt"`.
pub fn clean_html_entities(command: &str) -> Cow<'_, str> {
    if !command.contains('&') {
        return Cow::Borrowed(command);
    }
    let mut out = command.to_string();
    for (entity, literal) in ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, literal);
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_restored() {
        assert_eq!(
            clean_html_entities("echo &quot;a b&quot; &#39;c&#39;"),
            "echo \"a b\" 'c'"
        );
    }

    #[test]
    fn redirections_are_restored() {
        assert_eq!(clean_html_entities("ls &gt; out &amp;&amp; cat &lt; out"), "ls > out && cat < out");
    }

    #[test]
    fn double_encoding_is_decoded_once() {
        assert_eq!(clean_html_entities("&amp;quot;"), "&quot;");
    }

    #[test]
    fn plain_commands_are_borrowed() {
        assert!(matches!(clean_html_entities("echo ok"), Cow::Borrowed("echo ok")));
        assert!(matches!(clean_html_entities("a & b"), Cow::Owned(_)));
        assert_eq!(clean_html_entities("a & b"), "a & b");
    }
}
