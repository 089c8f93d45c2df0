/// The `pack_identity` module derives the stable `resource-pack-id` UUID of a
/// pack from the SHA-1 of its archive.
pub mod pack_identity;

/// The `properties` module patches `server.properties` style files, rewriting
/// only the keys it manages and leaving every other line exactly as it was.
pub mod properties;

/// The `plugin_config` module points the plugin's YAML `config.yml` at a
/// published pack.
pub mod plugin_config;

/// The `pack_config` module loads and saves the builder's own settings file.
pub mod pack_config;

/// The `mcmeta` module is responsible for reading and writing `.mcmeta` files,
/// which describe a resource pack's format and description.
pub mod mcmeta;

/// The `backgrounds` module writes the GUI background textures, from custom
/// art or generated placeholders.
pub mod backgrounds;

/// The `font` module builds the bitmap font that renders backgrounds and
/// spacing glyphs.
pub mod font;

/// The `archive` module merges a base pack into the build tree, zips the
/// result deterministically and hashes archives with SHA-1.
pub mod archive;

/// The `builder` module runs the whole pack build in a temporary directory.
pub mod builder;

/// The `codegen` module writes the Java constants class for the plugin.
pub mod codegen;

/// The `filesystem` module provides utility functions for working with the
/// filesystem, such as copying trees and replacing files atomically.
pub mod filesystem;

/// The `publish` module uploads packs to file hosts or GitHub Releases and
/// verifies what was published.
pub mod publish;
