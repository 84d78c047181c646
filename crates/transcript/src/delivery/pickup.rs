//! PickupDirectoryClient - writes each transcript as an `.eml` file
//!
//! Mirrors a mail server pickup directory: another process picks the
//! files up and relays them.

use chrono::Utc;
use std::any::Any;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use contracts::{DeliveryClient, OutboundMessage, SecurityMode, TranscriptError};
use tracing::{debug, instrument};

/// Configuration for PickupDirectoryClient
#[derive(Debug, Clone)]
pub struct PickupDirectoryConfig {
    /// Directory the message files are written to
    pub directory: PathBuf,
}

/// Client that drops messages into a pickup directory
#[derive(Debug)]
pub struct PickupDirectoryClient {
    name: String,
    config: PickupDirectoryConfig,
    connected: bool,
}

impl PickupDirectoryClient {
    /// Create a new PickupDirectoryClient
    pub fn new(name: impl Into<String>, config: PickupDirectoryConfig) -> Self {
        Self {
            name: name.into(),
            config,
            connected: false,
        }
    }

    pub fn directory(&self) -> &PathBuf {
        &self.config.directory
    }

    /// Redirect output, e.g. from a decision callback
    pub fn set_directory(&mut self, directory: impl Into<PathBuf>) {
        self.config.directory = directory.into();
    }

    fn render_message(message: &OutboundMessage) -> String {
        let mut out = String::new();
        for (header, values) in [
            ("From", &message.from),
            ("To", &message.to),
            ("Cc", &message.cc),
        ] {
            if !values.is_empty() {
                out.push_str(&format!("{header}: {}\r\n", values.join(", ")));
            }
        }
        out.push_str(&format!("Subject: {}\r\n", message.subject));
        out.push_str(&format!("Date: {}\r\n", Utc::now().to_rfc2822()));
        out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        out.push_str("\r\n");
        out.push_str(&message.body);
        out
    }

    fn write_message(&self, message: &OutboundMessage) -> io::Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let content = Self::render_message(message);

        for seq in 0u32.. {
            let name = format!("{stamp}-{seq:04}.eml");
            match stage_file(&self.config.directory, &name, |file| {
                file.write_all(content.as_bytes())
            }) {
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                written => return written,
            }
        }
        Err(io::Error::other("pickup directory name space exhausted"))
    }
}

/// Write `name` through a `.tmp` sibling and rename it into place
///
/// The relay only ever sees complete files; a failed write removes the
/// staged file. `AlreadyExists` means the name is taken.
fn stage_file<F>(directory: &Path, name: &str, write: F) -> io::Result<PathBuf>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let staged = directory.join(format!("{name}.tmp"));
    let target = directory.join(name);

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&staged)?;
    if target.exists() {
        drop(file);
        let _ = fs::remove_file(&staged);
        return Err(io::ErrorKind::AlreadyExists.into());
    }

    let written = write(&mut file).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written.and_then(|()| fs::rename(&staged, &target)) {
        let _ = fs::remove_file(&staged);
        return Err(e);
    }
    Ok(target)
}

impl DeliveryClient for PickupDirectoryClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "pickup_client_connect",
        skip(self),
        fields(client = %self.name, directory = %self.config.directory.display())
    )]
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        security: SecurityMode,
    ) -> Result<(), TranscriptError> {
        // Host, port and security do not apply to a local directory
        let _ = (host, port, security);
        fs::create_dir_all(&self.config.directory).map_err(|e| {
            TranscriptError::connect(
                &self.name,
                format!(
                    "cannot prepare pickup directory {}",
                    self.config.directory.display()
                ),
            )
            .with_source(e)
        })?;
        self.connected = true;
        Ok(())
    }

    #[instrument(name = "pickup_client_send", skip(self, message), fields(client = %self.name))]
    fn send(&mut self, message: &OutboundMessage) -> Result<(), TranscriptError> {
        if !self.connected {
            return Err(TranscriptError::send(&self.name, "not connected"));
        }
        let path = self.write_message(message).map_err(|e| {
            TranscriptError::send(&self.name, "failed to write message file").with_source(e)
        })?;
        debug!(client = %self.name, path = %path.display(), "Transcript written");
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_pickup_client_writes_eml() {
        let dir = tempdir().unwrap();
        let config = PickupDirectoryConfig {
            directory: dir.path().join("outbox"),
        };
        let mut client = PickupDirectoryClient::new("test_pickup", config);

        let mut msg = OutboundMessage::new("Log Transcript", "line one\r\nline two");
        msg.to.push("ops@example.com".into());

        client.connect("", 25, SecurityMode::Auto).unwrap();
        client.send(&msg).unwrap();
        client.send(&msg).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path().join("outbox"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|p| p.extension().is_some_and(|ext| ext == "eml")));

        let content = fs::read_to_string(&entries[0]).unwrap();
        assert!(content.starts_with("To: ops@example.com\r\n"));
        assert!(content.contains("Subject: Log Transcript\r\n"));
        assert!(content.ends_with("\r\n\r\nline one\r\nline two"));
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let dir = tempdir().unwrap();

        let err = stage_file(dir.path(), "partial.eml", |file| {
            file.write_all(b"Subject: Log Transcript\r\n")?;
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "disk full");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_staging_never_overwrites_existing_message() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("taken.eml"), "first").unwrap();

        let err = stage_file(dir.path(), "taken.eml", |file| file.write_all(b"second"))
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(dir.path().join("taken.eml")).unwrap(), "first");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_pickup_client_requires_connect() {
        let dir = tempdir().unwrap();
        let mut client = PickupDirectoryClient::new(
            "test_pickup",
            PickupDirectoryConfig {
                directory: dir.path().to_path_buf(),
            },
        );
        let err = client.send(&OutboundMessage::default()).unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }
}
