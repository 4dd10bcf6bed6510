use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub course_id: String,
    pub title: String,
    pub enrolled_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unenrollment {
    pub course_id: String,
    pub title: String,
    pub unenrolled_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub skipped: bool,
}

impl Unenrollment {
    pub fn reason_recorded(&self) -> bool {
        self.reason.is_some() || self.skipped
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default, rename = "enrollment")]
    enrollments: Vec<Enrollment>,
    #[serde(default, rename = "unenrollment")]
    unenrollments: Vec<Unenrollment>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            enrollments: Vec::new(),
            unenrollments: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read enrollment store at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse enrollment store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to write enrollment store at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize enrollment store: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("unsupported enrollment store version (expected 1, found {found})")]
    UnsupportedVersion { found: u32 },
    #[error("course '{course_id}' is not in the enrollment store")]
    UnknownCourse { course_id: String },
    #[error("already enrolled in course '{course_id}'")]
    DuplicateCourse { course_id: String },
}

/// Enrollment list persisted as TOML. Every operation re-reads the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentStore {
    path: PathBuf,
}

impl EnrollmentStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current enrollments, newest first.
    pub fn list(&self) -> Result<Vec<Enrollment>, StoreError> {
        let mut entries = self.load()?.enrollments;
        entries.sort_by(|left, right| right.enrolled_at.cmp(&left.enrolled_at));
        Ok(entries)
    }

    pub fn history(&self) -> Result<Vec<Unenrollment>, StoreError> {
        Ok(self.load()?.unenrollments)
    }

    pub fn enroll(&self, course_id: &str, title: &str) -> Result<Enrollment, StoreError> {
        let entry = Enrollment {
            course_id: course_id.to_string(),
            title: title.to_string(),
            enrolled_at: now_utc_rfc3339()?,
        };
        self.insert(entry.clone())?;
        Ok(entry)
    }

    pub fn insert(&self, entry: Enrollment) -> Result<(), StoreError> {
        let mut file = self.load()?;
        if file
            .enrollments
            .iter()
            .any(|existing| existing.course_id == entry.course_id)
        {
            return Err(StoreError::DuplicateCourse {
                course_id: entry.course_id,
            });
        }

        file.enrollments.push(entry);
        self.write(&file)
    }

    pub fn unenroll(&self, course_id: &str) -> Result<Unenrollment, StoreError> {
        let mut file = self.load()?;
        let index = file
            .enrollments
            .iter()
            .position(|entry| entry.course_id == course_id)
            .ok_or_else(|| StoreError::UnknownCourse {
                course_id: course_id.to_string(),
            })?;

        let removed = file.enrollments.remove(index);
        let record = Unenrollment {
            course_id: removed.course_id,
            title: removed.title,
            unenrolled_at: now_utc_rfc3339()?,
            reason: None,
            skipped: false,
        };
        file.unenrollments.push(record.clone());
        self.write(&file)?;

        debug!(course_id, "unenrolled");
        Ok(record)
    }

    /// Attaches a reason (or a skip) to the latest unenrollment of `course_id`.
    pub fn record_reason(
        &self,
        course_id: &str,
        reason: Option<&str>,
        skipped: bool,
    ) -> Result<Unenrollment, StoreError> {
        let mut file = self.load()?;
        let record = file
            .unenrollments
            .iter_mut()
            .rev()
            .find(|record| record.course_id == course_id)
            .ok_or_else(|| StoreError::UnknownCourse {
                course_id: course_id.to_string(),
            })?;

        record.reason = reason.map(str::to_string);
        record.skipped = skipped;
        let updated = record.clone();
        self.write(&file)?;

        debug!(course_id, skipped, "recorded unenroll reason");
        Ok(updated)
    }

    fn load(&self) -> Result<StoreFile, StoreError> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let parsed: StoreFile = toml::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        if parsed.version != STORE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: parsed.version,
            });
        }

        Ok(parsed)
    }

    fn write(&self, file: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let serialized = toml::to_string(file)?;
        let temp_path = self.path.with_extension("toml.tmp");

        fs::write(&temp_path, serialized).map_err(|source| StoreError::Write {
            path: temp_path.clone(),
            source,
        })?;

        fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        Ok(())
    }
}

pub fn now_utc_rfc3339() -> Result<String, time::error::Format> {
    OffsetDateTime::now_utc().format(&Rfc3339)
}
