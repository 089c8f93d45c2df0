use std::path::Path;
use tracing::info;

use crate::backgrounds::BackgroundMeta;
use crate::filesystem::{self, FilesystemError};

pub const JAVA_PACKAGE: &str = "gg.paleraven.bitterharvest.gui.backgrounds";
pub const JAVA_CLASS: &str = "GeneratedBackgrounds";

/// Renders the Java class exposing the pack SHA-1 and one `char` constant per
/// background glyph.
pub fn render_java_constants(backgrounds: &[BackgroundMeta], sha1: &str) -> String {
    let mut lines = vec![
        "// AUTO-GENERATED by resourcepack-builder".to_string(),
        "// Do not edit manually".to_string(),
        String::new(),
        format!("package {JAVA_PACKAGE};"),
        String::new(),
        format!("public final class {JAVA_CLASS} {{"),
        String::new(),
        format!("    public static final String PACK_SHA1 = \"{sha1}\";"),
        String::new(),
        "    // Background characters".to_string(),
    ];

    for bg in backgrounds {
        lines.push(format!(
            "    public static final char BG_{} = '\\u{:04X}';",
            bg.name.to_uppercase(),
            bg.codepoint
        ));
    }

    lines.extend([
        String::new(),
        format!("    private {JAVA_CLASS}() {{}}"),
        "}".to_string(),
        String::new(),
    ]);
    lines.join("\n")
}

/// Writes the generated class to `out`, creating parent directories.
pub fn generate_java_constants(
    backgrounds: &[BackgroundMeta],
    sha1: &str,
    out: &Path,
) -> Result<(), FilesystemError> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        filesystem::create_if_not_exists(parent)?;
    }
    filesystem::write_atomic(out, render_java_constants(backgrounds, sha1).as_bytes())?;
    info!(path = %out.display(), "generated Java constants");
    Ok(())
}
