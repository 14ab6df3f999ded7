//! Human-readable and shell-script renderings of a [`Recommendation`].

use super::Recommendation;
use std::io::{self, Write};
use std::path::Path;

/// Quote a path for bash
///
/// Names with control characters (a newline would end a `##` comment) use
/// `$'...'` quoting with every control character escaped.
fn quoted(path: &Path) -> String {
    let text = path.display().to_string();
    if text.chars().any(char::is_control) {
        return ansi_c_quoted(&text);
    }
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('`', "\\`");
    format!("\"{}\"", escaped)
}

fn ansi_c_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 3);
    out.push_str("$'");
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("\\x{:02x}", byte));
                }
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Print the recommendation for a person to read
pub fn render_listing<W: Write>(rec: &Recommendation, out: &mut W) -> io::Result<()> {
    writeln!(out, "Recommend removal of {} file(s):", rec.erase.len())?;
    for path in &rec.erase {
        writeln!(out, "Remove: {}", quoted(path))?;
    }
    writeln!(out)?;

    writeln!(out, "Check {} duplication(s):", rec.check.len())?;
    for set in &rec.check {
        let mut paths = set.iter();
        if let Some(first) = paths.next() {
            writeln!(out, "check: {}", quoted(first))?;
        }
        for path in paths {
            writeln!(out, "  - {}", quoted(path))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Write a bash script that erases the disposable copies
///
/// Sets that need review are written as comments only.
pub fn render_script<W: Write>(rec: &Recommendation, out: &mut W) -> io::Result<()> {
    writeln!(out, "#!/usr/bin/env bash")?;
    writeln!(out)?;
    writeln!(out, "## Recommending removal of {} files...", rec.erase.len())?;
    for path in &rec.erase {
        writeln!(out, "rm -f {}", quoted(path))?;
    }

    writeln!(out, "## Should be checking {} duplications...", rec.check.len())?;
    for set in &rec.check {
        let mut paths = set.iter();
        if let Some(first) = paths.next() {
            writeln!(out, "## check: {}", quoted(first))?;
        }
        for path in paths {
            writeln!(out, "##  - {}", quoted(path))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn recommendation() -> Recommendation {
        Recommendation {
            erase: vec![PathBuf::from("/photos/img~.jpg")],
            check: vec![vec![
                PathBuf::from("/dir1/a.jpg"),
                PathBuf::from("/dir2/b \"copy\".jpg"),
            ]],
        }
    }

    #[test]
    fn script_starts_with_shebang_and_quotes_paths() {
        let mut out = Vec::new();
        render_script(&recommendation(), &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();

        assert!(script.starts_with("#!/usr/bin/env bash\n"));
        assert!(script.contains("rm -f \"/photos/img~.jpg\"\n"));
        assert!(script.contains("## check: \"/dir1/a.jpg\"\n"));
        assert!(script.contains("##  - \"/dir2/b \\\"copy\\\".jpg\"\n"));
        // review sets never produce commands
        assert_eq!(script.matches("rm -f").count(), 1);
    }

    #[test]
    fn listing_counts_both_sections() {
        let mut out = Vec::new();
        render_listing(&recommendation(), &mut out).unwrap();
        let listing = String::from_utf8(out).unwrap();

        assert!(listing.starts_with("Recommend removal of 1 file(s):\n"));
        assert!(listing.contains("Remove: \"/photos/img~.jpg\""));
        assert!(listing.contains("Check 1 duplication(s):"));
        assert!(listing.contains("  - \"/dir2/"));
    }

    #[test]
    fn newline_in_name_stays_inside_the_comment() {
        let rec = Recommendation {
            erase: vec![PathBuf::from("/dir1/x\nrm -rf ~ #.jpg")],
            check: vec![vec![
                PathBuf::from("/dir1/a.jpg"),
                PathBuf::from("/dir2/a\nrm -rf ~ #.jpg"),
            ]],
        };
        let mut out = Vec::new();
        render_script(&rec, &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();

        for line in script.lines().skip(1) {
            assert!(
                line.is_empty() || line.starts_with("##") || line.starts_with("rm -f "),
                "unexpected line {:?}",
                line
            );
        }
        assert!(script.contains("##  - $'/dir2/a\\nrm -rf ~ #.jpg'\n"));
        assert!(script.contains("rm -f $'/dir1/x\\nrm -rf ~ #.jpg'\n"));
    }

    #[test]
    fn control_characters_use_ansi_c_quoting() {
        assert_eq!(quoted(Path::new("/a/it's\t\u{1}.jpg")), "$'/a/it\\'s\\t\\x01.jpg'");
    }

    #[test]
    fn dollar_signs_are_escaped() {
        assert_eq!(quoted(Path::new("/a/$HOME.jpg")), "\"/a/\\$HOME.jpg\"");
    }
}
