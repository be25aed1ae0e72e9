//! Import/export classification.

use std::fmt;
use std::path::Path;

/// What a migration will do, decided once when it is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationOperation {
    /// File into a new table.
    Import,
    /// Existing table into a new file.
    Export,
    /// Neither is possible.
    Invalid,
}

impl fmt::Display for MigrationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Export => write!(f, "export"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// What the source path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Nothing exists at the path.
    Missing,
    /// A regular file (or anything that is not a directory).
    File,
    /// A directory.
    Directory,
}

impl SourceKind {
    /// Inspects `path` on the filesystem.
    #[must_use]
    pub fn probe(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Self::Directory,
            Ok(_) => Self::File,
            Err(_) => Self::Missing,
        }
    }
}

/// Classification outcome before any store or file work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Import or export is permitted.
    Permitted(MigrationOperation),
    /// The path does not exist.
    WrongPath,
    /// Directory given, table missing.
    NoFileAndNoTable,
    /// File given, table present.
    EverythingExists,
}

impl Classification {
    /// Returns the operation this classification allows.
    #[must_use]
    pub const fn operation(self) -> MigrationOperation {
        match self {
            Self::Permitted(op) => op,
            Self::WrongPath | Self::NoFileAndNoTable | Self::EverythingExists => {
                MigrationOperation::Invalid
            },
        }
    }
}

/// Classifies a migration from the source kind and table existence.
///
/// | Source | Table exists | Result |
/// |--------|--------------|--------|
/// | missing | any | `WrongPath` |
/// | file | no | Import |
/// | file | yes | `EverythingExists` |
/// | directory | yes | Export |
/// | directory | no | `NoFileAndNoTable` |
#[must_use]
pub const fn classify(source: SourceKind, table_exists: bool) -> Classification {
    match (source, table_exists) {
        (SourceKind::Missing, _) => Classification::WrongPath,
        (SourceKind::File, false) => Classification::Permitted(MigrationOperation::Import),
        (SourceKind::File, true) => Classification::EverythingExists,
        (SourceKind::Directory, true) => Classification::Permitted(MigrationOperation::Export),
        (SourceKind::Directory, false) => Classification::NoFileAndNoTable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(SourceKind::Missing, false => Classification::WrongPath; "missing path")]
    #[test_case(SourceKind::Missing, true => Classification::WrongPath; "missing path with table")]
    #[test_case(SourceKind::File, false => Classification::Permitted(MigrationOperation::Import); "file to new table")]
    #[test_case(SourceKind::File, true => Classification::EverythingExists; "file and table")]
    #[test_case(SourceKind::Directory, true => Classification::Permitted(MigrationOperation::Export); "table to directory")]
    #[test_case(SourceKind::Directory, false => Classification::NoFileAndNoTable; "directory without table")]
    fn test_classify(source: SourceKind, table_exists: bool) -> Classification {
        classify(source, table_exists)
    }

    #[test]
    fn test_invalid_operation() {
        assert_eq!(
            Classification::EverythingExists.operation(),
            MigrationOperation::Invalid
        );
        assert_eq!(
            classify(SourceKind::Directory, true).operation(),
            MigrationOperation::Export
        );
    }

    #[test]
    fn test_probe() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.csv");
        std::fs::write(&file, "id\n").unwrap();
        assert_eq!(SourceKind::probe(dir.path()), SourceKind::Directory);
        assert_eq!(SourceKind::probe(&file), SourceKind::File);
        assert_eq!(
            SourceKind::probe(&dir.path().join("missing")),
            SourceKind::Missing
        );
    }
}
