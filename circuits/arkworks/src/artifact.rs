//! Artifact Persistence
//!
//! One generic save/load pair for every artifact the lifecycle produces
//! (constraint system, proving key, verifying key, proof), shared by all
//! circuit types.
//!
//! Artifacts are written as raw uncompressed arkworks encodings and read
//! back with full validation (points on curve and in the prime-order
//! subgroup). Each circuit gets its own directory:
//!
//! ```text
//! <root>/<circuit>/circuit.ccs
//! <root>/<circuit>/proving.key
//! <root>/<circuit>/verifying.key
//! <root>/<circuit>/proof.data
//! <root>/<circuit>/vk.json              (display only, never read back)
//! <root>/<circuit>/public_witness.json  (read by verifiers)
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ark_ec::pairing::Pairing;
use ark_ff::PrimeField;
use ark_groth16::{Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::backend::CompiledCircuit;

/// The four persisted artifact kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    ConstraintSystem,
    ProvingKey,
    VerifyingKey,
    Proof,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::ConstraintSystem,
        ArtifactKind::ProvingKey,
        ArtifactKind::VerifyingKey,
        ArtifactKind::Proof,
    ];

    /// File name inside a circuit's artifact directory
    pub const fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::ConstraintSystem => "circuit.ccs",
            ArtifactKind::ProvingKey => "proving.key",
            ArtifactKind::VerifyingKey => "verifying.key",
            ArtifactKind::Proof => "proof.data",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::ConstraintSystem => "constraint system",
            ArtifactKind::ProvingKey => "proving key",
            ArtifactKind::VerifyingKey => "verifying key",
            ArtifactKind::Proof => "proof",
        };
        f.write_str(name)
    }
}

/// Failures while persisting or restoring artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The file could not be opened, created or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes do not decode to a valid artifact (truncated, corrupted,
    /// or a different kind)
    #[error("malformed {kind} at {}: {source}", path.display())]
    Malformed {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: SerializationError,
    },

    #[error("JSON error at {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Anything that can be persisted as a raw artifact
pub trait Artifact: CanonicalSerialize + CanonicalDeserialize {
    const KIND: ArtifactKind;
}

impl<F: PrimeField> Artifact for CompiledCircuit<F> {
    const KIND: ArtifactKind = ArtifactKind::ConstraintSystem;
}

impl<E: Pairing> Artifact for ProvingKey<E> {
    const KIND: ArtifactKind = ArtifactKind::ProvingKey;
}

impl<E: Pairing> Artifact for VerifyingKey<E> {
    const KIND: ArtifactKind = ArtifactKind::VerifyingKey;
}

impl<E: Pairing> Artifact for Proof<E> {
    const KIND: ArtifactKind = ArtifactKind::Proof;
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `artifact` to `path` as a raw byte stream
pub fn save<A: Artifact>(artifact: &A, path: &Path) -> Result<(), ArtifactError> {
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);

    artifact
        .serialize_uncompressed(&mut writer)
        .map_err(|e| match e {
            SerializationError::IoError(source) => io_error(path)(source),
            source => ArtifactError::Malformed {
                kind: A::KIND,
                path: path.to_path_buf(),
                source,
            },
        })?;
    writer.flush().map_err(io_error(path))?;

    tracing::debug!("Saved {} to {}", A::KIND, path.display());
    Ok(())
}

/// Read an artifact back from `path`
pub fn load<A: Artifact>(path: &Path) -> Result<A, ArtifactError> {
    let file = File::open(path).map_err(io_error(path))?;
    let reader = BufReader::new(file);

    let artifact = A::deserialize_uncompressed(reader).map_err(|source| ArtifactError::Malformed {
        kind: A::KIND,
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Loaded {} from {}", A::KIND, path.display());
    Ok(artifact)
}

/// Read a JSON document such as an exported public witness
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(io_error(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Artifact directory of one circuit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDir {
    dir: PathBuf,
}

impl ArtifactDir {
    /// `<root>/<circuit>`; nothing is created until the first save
    pub fn new(root: impl AsRef<Path>, circuit: &str) -> Self {
        Self {
            dir: root.as_ref().join(circuit),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn contains(&self, kind: ArtifactKind) -> bool {
        self.path_of(kind).is_file()
    }

    fn ensure_dir(&self) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))
    }

    pub fn save<A: Artifact>(&self, artifact: &A) -> Result<PathBuf, ArtifactError> {
        self.ensure_dir()?;
        let path = self.path_of(A::KIND);
        save(artifact, &path)?;
        Ok(path)
    }

    pub fn load<A: Artifact>(&self) -> Result<A, ArtifactError> {
        load(&self.path_of(A::KIND))
    }

    /// Pretty-printed JSON document next to the raw artifacts
    pub fn save_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<PathBuf, ArtifactError> {
        self.ensure_dir()?;
        let path = self.dir.join(file_name);
        let file = File::create(&path).map_err(io_error(&path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| ArtifactError::Json {
            path: path.clone(),
            source,
        })?;
        writer.flush().map_err(io_error(&path))?;
        Ok(path)
    }

    pub fn load_json<T: DeserializeOwned>(&self, file_name: &str) -> Result<T, ArtifactError> {
        load_json(&self.dir.join(file_name))
    }
}
