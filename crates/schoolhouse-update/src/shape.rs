//! Content-shape heuristic applied to a candidate before it is written.
//!
//! Rejects obvious non-artifacts such as HTML error pages served with a 200
//! status, and candidates of a different kind than the artifact they would
//! replace (a script over a native executable). This is not an integrity
//! check.

use schoolhouse_core::config::UpdateConfig;

use crate::error::UpdateError;

/// Coarse classification of artifact content by its leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Elf,
    Pe,
    MachO,
    /// Anything without a known executable header, including scripts.
    Text,
}

impl ArtifactKind {
    pub fn of(content: &[u8]) -> Self {
        const MACHO_MAGIC: [[u8; 4]; 5] = [
            [0xfe, 0xed, 0xfa, 0xce],
            [0xfe, 0xed, 0xfa, 0xcf],
            [0xce, 0xfa, 0xed, 0xfe],
            [0xcf, 0xfa, 0xed, 0xfe],
            [0xca, 0xfe, 0xba, 0xbe],
        ];

        if content.starts_with(b"\x7fELF") {
            ArtifactKind::Elf
        } else if content.starts_with(b"MZ") {
            ArtifactKind::Pe
        } else if MACHO_MAGIC.iter().any(|magic| content.starts_with(magic)) {
            ArtifactKind::MachO
        } else {
            ArtifactKind::Text
        }
    }
}

/// Accepts content whose first non-whitespace bytes match one of the
/// configured prefix tokens.
#[derive(Debug, Clone)]
pub struct ShapeCheck {
    prefixes: Vec<String>,
}

impl ShapeCheck {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    pub fn from_config(config: &UpdateConfig) -> Self {
        Self::new(config.accepted_prefixes.clone())
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Check the candidate content.
    pub fn check(&self, content: &[u8]) -> Result<(), UpdateError> {
        let trimmed = content.trim_ascii_start();
        if trimmed.is_empty() {
            return Err(UpdateError::RemoteContentInvalid(
                "candidate is empty".to_string(),
            ));
        }

        if self
            .prefixes
            .iter()
            .any(|prefix| trimmed.starts_with(prefix.as_bytes()))
        {
            Ok(())
        } else {
            let head = String::from_utf8_lossy(&trimmed[..trimmed.len().min(16)]).into_owned();
            Err(UpdateError::RemoteContentInvalid(format!(
                "candidate starts with {:?}, expected one of {:?}",
                head, self.prefixes
            )))
        }
    }
}

impl ShapeCheck {
    /// Check the candidate content and require it to be the same kind of
    /// artifact as `local`.
    pub fn check_against(&self, local: &[u8], candidate: &[u8]) -> Result<(), UpdateError> {
        let local_kind = ArtifactKind::of(local);
        let candidate_kind = ArtifactKind::of(candidate);
        if local_kind != candidate_kind {
            return Err(UpdateError::RemoteContentInvalid(format!(
                "candidate is {:?} content but the local artifact is {:?}",
                candidate_kind, local_kind
            )));
        }
        self.check(candidate)
    }
}

impl Default for ShapeCheck {
    fn default() -> Self {
        Self::from_config(&UpdateConfig::default())
    }
}
