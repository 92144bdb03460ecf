use std::borrow::Cow;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::read_wav;
use crate::{Error, Result, SpeechEngine, SynthesisResult};

/// Upper bound on a single espeak-ng invocation.
pub const DEFAULT_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Parameters for an espeak-ng voice.
#[derive(Debug, Clone)]
pub struct EspeakParams {
    /// espeak-ng voice name (e.g. `"en-us"`, `"en-gb"`).
    pub voice: String,
    /// Speaking rate in words per minute.
    pub words_per_minute: u32,
    /// A call running longer than this is killed and reported as failed.
    pub timeout: Duration,
}

impl Default for EspeakParams {
    fn default() -> Self {
        Self {
            voice: "en-us".to_string(),
            words_per_minute: 165,
            timeout: DEFAULT_SYNTHESIS_TIMEOUT,
        }
    }
}

/// espeak-ng, run as a subprocess per utterance.
///
/// Every call spawns its own process and writes to its own temporary
/// file, so the engine is safe to share across synthesis workers.
///
/// ```rust,no_run
/// use superreader::{engines::espeak::EspeakEngine, SpeechEngine};
/// use std::path::PathBuf;
///
/// // Point to a bundled espeak-ng binary and data directory
/// let engine = EspeakEngine::with_espeak(
///     Some(PathBuf::from("/app/resources/espeak-ng/espeak-ng")),
///     Some(PathBuf::from("/app/resources/espeak-ng-data")),
/// );
/// let result = engine.synthesize("Hello, world!")?;
/// # Ok::<(), superreader::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EspeakEngine {
    bin_path: Option<PathBuf>,
    data_path: Option<PathBuf>,
    params: EspeakParams,
}

impl EspeakEngine {
    /// Create a new engine that uses `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new engine with explicit espeak-ng binary and data paths.
    ///
    /// Either path can be `None` to fall back to the system default.
    pub fn with_espeak(bin_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Self {
        Self {
            bin_path,
            data_path,
            params: EspeakParams::default(),
        }
    }

    pub fn with_params(mut self, params: EspeakParams) -> Self {
        self.params = params;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = match &self.bin_path {
            Some(path) => Command::new(path),
            None => Command::new("espeak-ng"),
        };
        if let Some(data) = &self.data_path {
            cmd.env("ESPEAK_DATA_PATH", data);
        }
        cmd
    }

    /// Wait for `child`, killing it once the configured timeout passes.
    fn wait_bounded(&self, child: &mut std::process::Child) -> Result<std::process::ExitStatus> {
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() > self.params.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::SynthesisFailed(format!(
                    "espeak-ng timed out after {:?}",
                    self.params.timeout
                )));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn spawn_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::EspeakNotFound
    } else {
        Error::Io(e)
    }
}

/// espeak-ng reads stdin line by line; a missing final newline can cut off
/// the last word.
fn canonicalize_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

impl SpeechEngine for EspeakEngine {
    fn check_available(&self) -> Result<()> {
        let output = self
            .command()
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(spawn_error)?;
        if !output.status.success() {
            return Err(Error::EngineUnavailable(format!(
                "espeak-ng --version exited with code {:?}",
                output.status.code()
            )));
        }
        log::info!(
            "Using {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    fn synthesize(&self, text: &str) -> Result<SynthesisResult> {
        // Newlines would be read as separate utterances.
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Err(Error::SynthesisFailed("empty text".to_string()));
        }

        let wav = tempfile::Builder::new()
            .prefix("superreader-")
            .suffix(".wav")
            .tempfile()?;

        let mut child = self
            .command()
            .args(["--stdin", "-q", "-v", self.params.voice.as_str()])
            .arg("-s")
            .arg(self.params.words_per_minute.to_string())
            .arg("-w")
            .arg(wav.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Drained concurrently so a chatty process cannot fill the pipe and stall.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(canonicalize_stdin_payload(&text).as_bytes())?;
        }

        let status = self.wait_bounded(&mut child)?;
        let stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(Error::SynthesisFailed(format!(
                "espeak-ng exited with code {:?}: {}",
                status.code(),
                stderr.trim()
            )));
        }

        let audio = read_wav(wav.path())?;
        if audio.samples.is_empty() {
            return Err(Error::SynthesisFailed(format!(
                "espeak-ng produced no audio for {text:?}"
            )));
        }
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn espeak_available() -> bool {
        Command::new("espeak-ng").arg("--version").output().is_ok()
    }

    #[test]
    fn appends_trailing_newline_for_stdin() {
        assert_eq!(canonicalize_stdin_payload("America"), "America\n");
        assert_eq!(canonicalize_stdin_payload("America\n"), "America\n");
    }

    #[test]
    fn missing_binary_is_reported() {
        let engine = EspeakEngine::with_espeak(
            Some(PathBuf::from("/nonexistent/espeak-ng-binary")),
            None,
        );
        assert!(matches!(engine.check_available(), Err(Error::EspeakNotFound)));
        assert!(matches!(engine.synthesize("Hello"), Err(Error::EspeakNotFound)));
    }

    #[test]
    fn empty_text_is_rejected_before_spawning() {
        let engine = EspeakEngine::with_espeak(Some(PathBuf::from("/nonexistent")), None);
        assert!(matches!(
            engine.synthesize("  \n "),
            Err(Error::SynthesisFailed(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn noisy_stderr_does_not_stall_the_call() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-espeak");
        // Far more than a pipe buffer holds, then a failing exit.
        std::fs::write(
            &script,
            "#!/bin/sh\ncat >/dev/null\nhead -c 300000 /dev/zero | tr '\\0' x >&2\nexit 3\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = EspeakEngine::with_espeak(Some(script), None).with_params(EspeakParams {
            timeout: Duration::from_secs(30),
            ..Default::default()
        });
        let started = Instant::now();
        match engine.synthesize("Hello") {
            Err(Error::SynthesisFailed(msg)) => {
                assert!(msg.contains("code Some(3)"), "{}", &msg[..msg.len().min(80)]);
                assert!(msg.ends_with('x'));
            }
            other => panic!("expected a failed synthesis, got {:?}", other.map(|_| ())),
        }
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn synthesizes_real_audio_when_installed() {
        // Skip when espeak-ng is unavailable in the execution environment.
        if !espeak_available() {
            return;
        }
        let result = EspeakEngine::new().synthesize("Hello there.").unwrap();
        assert!(result.sample_rate > 0);
        assert!(result.duration_secs() > 0.2);
    }
}
