//! Build/run log colorizer: HTML escaping followed by ANSI SGR rewriting.

/// Characters escaped before any ANSI rewriting, applied in order.
const HTML_ESCAPES: [(&str, &str); 5] = [
    ("&", "&amp;"),
    ("<", "&lt;"),
    (">", "&gt;"),
    ("\"", "&quot;"),
    ("'", "&#039;"),
];

/// Literal escape sequences and their markup, applied in order.
///
/// The dim-italic forms of 35 and 36 map to `t-cyan` and `t-magenta`,
/// swapped relative to the plain forms further down.
pub const ANSI_REWRITES: [(&str, &str); 16] = [
    ("\x1b[?7l", ""),
    ("\x1b[2m", "<span class='t-dim'>"),
    ("\x1b[35m\x1b[3m", "<span class='t-cyan'><i>"),
    ("\x1b[36m\x1b[3m", "<span class='t-magenta'><i>"),
    ("\x1b[37m\x1b[3m", ""),
    ("\x1b[0;35m\x1b[0m", "</i></span>"),
    ("\x1b[0;36m\x1b[0m", "</i></span>"),
    ("\x1b[0;37m\x1b[0m", ""),
    ("\x1b[31m", "<span class='t-red'>"),
    ("\x1b[32m", "<span class='t-green'>"),
    ("\x1b[33m", "<span class='t-yellow'>"),
    ("\x1b[34m", "<span class='t-blue'>"),
    ("\x1b[35m", "<span class='t-magenta'>"),
    ("\x1b[36m", "<span class='t-cyan'>"),
    ("\x1b[37m", "<span class='t-white'>"),
    ("\x1b[0m", "</span>"),
];

fn apply(table: &[(&str, &str)], input: &str) -> String {
    table
        .iter()
        .fold(input.to_string(), |acc, (pattern, replacement)| {
            acc.replace(pattern, replacement)
        })
}

/// Escape `&`, `<`, `>`, `"` and `'` for embedding in markup.
#[must_use]
pub fn escape_html(input: &str) -> String {
    apply(&HTML_ESCAPES, input)
}

/// Rewrite the known ANSI SGR sequences into span markup.
///
/// Unknown sequences pass through untouched.
#[must_use]
pub fn rewrite_ansi(input: &str) -> String {
    apply(&ANSI_REWRITES, input)
}

/// Turn a raw log chunk into transcript markup.
#[must_use]
pub fn colorize_log(raw: &str) -> String {
    rewrite_ansi(&escape_html(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escaping() {
        assert_eq!(
            colorize_log(r#"A & B <script> "quote" 'tick'"#),
            "A &amp; B &lt;script&gt; &quot;quote&quot; &#039;tick&#039;"
        );
    }

    #[test]
    fn test_ampersand_escaped_first() {
        // Entities produced for `<` must not be escaped again.
        assert_eq!(escape_html("<&>"), "&lt;&amp;&gt;");
    }

    #[test]
    fn test_red_span() {
        assert_eq!(
            colorize_log("\x1b[31merr\x1b[0m"),
            "<span class='t-red'>err</span>"
        );
    }

    #[test]
    fn test_escaping_and_colors_combined() {
        assert_eq!(
            colorize_log("\x1b[32mok\x1b[0m <done>"),
            "<span class='t-green'>ok</span> &lt;done&gt;"
        );
    }

    #[test]
    fn test_wraparound_toggle_removed() {
        assert_eq!(colorize_log("\x1b[?7lStep 1/4"), "Step 1/4");
    }

    #[test]
    fn test_dim_italic_forms() {
        assert_eq!(
            colorize_log("\x1b[2m\x1b[35m\x1b[3mfile.ml\x1b[0;35m\x1b[0m\x1b[0m"),
            "<span class='t-dim'><span class='t-cyan'><i>file.ml</i></span></span>"
        );
        assert_eq!(
            colorize_log("\x1b[37m\x1b[3mhidden\x1b[0;37m\x1b[0m"),
            "hidden"
        );
    }

    #[test]
    fn test_cyan_magenta_naming_is_inverted_between_forms() {
        assert_eq!(colorize_log("\x1b[35m"), "<span class='t-magenta'>");
        assert_eq!(colorize_log("\x1b[35m\x1b[3m"), "<span class='t-cyan'><i>");
        assert_eq!(colorize_log("\x1b[36m"), "<span class='t-cyan'>");
        assert_eq!(colorize_log("\x1b[36m\x1b[3m"), "<span class='t-magenta'><i>");
    }

    #[test]
    fn test_unknown_sequences_pass_through() {
        assert_eq!(colorize_log("\x1b[1mbold"), "\x1b[1mbold");
    }
}
