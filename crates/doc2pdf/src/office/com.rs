//! Word and WPS through their COM automation endpoints.
//!
//! The COM object lives in a PowerShell host process. The host creates the
//! application invisibly, then serves one `input<TAB>output` request per
//! stdin line and answers `OK` or `ERR <message>`. Closing stdin makes the
//! host quit the application in a `finally` block and exit.
//!
//! The startup line carries the process id of the application the host
//! started (`READY <pid>`, `0` if it could not be told apart from instances
//! the user already had open). A host that hangs while quitting is killed
//! together with that process.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{EngineKind, EngineSession, OfficeEngine};
use crate::error::ConvertError;

/// How long a closing host gets to quit the application before it is killed.
const QUIT_GRACE: Duration = Duration::from_secs(15);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// `wdFormatPDF` in the Word object model; WPS uses the same value.
const FORMAT_PDF: u32 = 17;

const READY: &str = "READY";

/// Word or WPS, reached through COM.
#[derive(Debug, Clone)]
pub struct ComEngine {
    kind: EngineKind,
    prog_id: &'static str,
    /// Image name of the application process, without `.exe`.
    process: &'static str,
}

impl ComEngine {
    /// `None` if `kind` has no COM endpoint.
    pub fn new(kind: EngineKind) -> Option<Self> {
        let prog_id = kind.prog_id()?;
        let process = match kind {
            EngineKind::Word => "WINWORD",
            EngineKind::Wps => "wps",
            EngineKind::LibreOffice => return None,
        };
        Some(Self {
            kind,
            prog_id,
            process,
        })
    }

    pub fn prog_id(&self) -> &'static str {
        self.prog_id
    }

    fn export_error(&self, reason: impl Into<String>) -> ConvertError {
        ConvertError::EngineExport {
            engine: self.kind.name().to_string(),
            reason: reason.into(),
        }
    }
}

impl OfficeEngine for ComEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        if !cfg!(windows) {
            return false;
        }
        let script = check_script(self.prog_id);
        match powershell()
            .arg("-Command")
            .arg(&script)
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output.status.success(),
            Err(e) => {
                debug!(engine = %self.kind, error = %e, "could not run PowerShell");
                false
            }
        }
    }

    fn launch(&self) -> Result<Box<dyn EngineSession + '_>, ConvertError> {
        let mut script = tempfile::Builder::new()
            .prefix("doc2pdf-")
            .suffix(".ps1")
            .tempfile()?;
        script.write_all(host_script(self.prog_id, self.process).as_bytes())?;
        script.flush()?;

        let mut child = powershell()
            .arg("-File")
            .arg(script.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| self.export_error(format!("failed to start PowerShell: {e}")))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(BufReader::new);
        let mut session = ComSession {
            engine: self,
            child,
            stdin,
            stdout,
            app_pid: None,
            _script: script,
        };

        match session.read_reply()? {
            Some(line) => match parse_ready(&line) {
                Some(app_pid) => {
                    debug!(engine = %self.kind, ?app_pid, "hidden instance started");
                    session.app_pid = app_pid;
                    Ok(Box::new(session))
                }
                None => Err(self.export_error(format!("unexpected startup reply: {line}"))),
            },
            None => Err(self.export_error(format!(
                "could not create {} (is it installed?)",
                self.prog_id
            ))),
        }
    }
}

/// A PowerShell host holding one hidden application instance.
struct ComSession<'a> {
    engine: &'a ComEngine,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    /// The application process started by the host, when it is known.
    app_pid: Option<u32>,
    /// Keeps the script file alive for the life of the host.
    _script: NamedTempFile,
}

impl ComSession<'_> {
    /// Next line from the host, or `None` once it has exited.
    fn read_reply(&mut self) -> Result<Option<String>, ConvertError> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        let mut line = String::new();
        if stdout.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        // .NET may prefix the first UTF-8 line with a byte order mark.
        Ok(Some(line.trim_start_matches('\u{feff}').trim_end().to_string()))
    }
}

impl EngineSession for ComSession<'_> {
    fn export_pdf(&mut self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let request = format_request(input, output)
            .ok_or_else(|| self.engine.export_error("paths must not contain tabs or newlines"))?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| self.engine.export_error("engine host is closed"))?;
        stdin.write_all(request.as_bytes())?;
        stdin.flush()?;

        match self.read_reply()? {
            Some(reply) => parse_reply(&reply).map_err(|reason| self.engine.export_error(reason)),
            None => Err(self.engine.export_error("engine exited during export")),
        }
    }
}

impl Drop for ComSession<'_> {
    fn drop(&mut self) {
        // EOF on stdin ends the request loop; the host then quits the application.
        self.stdin.take();
        let deadline = Instant::now() + QUIT_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(engine = %self.engine.kind, %status, "hidden instance closed");
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
                Ok(None) => break,
                Err(e) => {
                    warn!(engine = %self.engine.kind, error = %e, "failed to poll engine host");
                    break;
                }
            }
        }
        warn!(engine = %self.engine.kind, "engine host did not exit, killing it");
        if let Some(pid) = self.app_pid {
            match kill_command(pid).status() {
                Ok(status) if status.success() => {
                    debug!(engine = %self.engine.kind, pid, "killed hidden instance");
                }
                Ok(status) => {
                    warn!(engine = %self.engine.kind, pid, %status, "taskkill failed");
                }
                Err(e) => {
                    warn!(engine = %self.engine.kind, pid, error = %e, "could not run taskkill");
                }
            }
        }
        if let Err(e) = self.child.kill() {
            warn!(engine = %self.engine.kind, error = %e, "failed to kill engine host");
        }
        let _ = self.child.wait();
    }
}

fn powershell() -> Command {
    let mut cmd = Command::new("powershell");
    cmd.args(["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass"]);
    cmd
}

/// Force-kill `pid` and any children it spawned.
fn kill_command(pid: u32) -> Command {
    let mut cmd = Command::new("taskkill");
    cmd.arg("/PID")
        .arg(pid.to_string())
        .args(["/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd
}

/// `Some(pid)` for a startup line, where a pid of 0 (or none) means unknown.
fn parse_ready(line: &str) -> Option<Option<u32>> {
    let rest = line.strip_prefix(READY)?;
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some(rest.trim().parse().ok().filter(|&pid| pid != 0))
}

fn format_request(input: &Path, output: &Path) -> Option<String> {
    let input = input.to_str()?;
    let output = output.to_str()?;
    let bad = |s: &str| s.contains(['\t', '\r', '\n']);
    if bad(input) || bad(output) {
        return None;
    }
    Some(format!("{input}\t{output}\n"))
}

fn parse_reply(reply: &str) -> Result<(), String> {
    if reply == "OK" {
        return Ok(());
    }
    match reply.strip_prefix("ERR") {
        Some(message) if !message.trim().is_empty() => Err(message.trim().to_string()),
        Some(_) => Err("unknown error".to_string()),
        None => Err(format!("unexpected reply: {reply}")),
    }
}

fn check_script(prog_id: &str) -> String {
    format!(
        "$ErrorActionPreference = 'Stop'; \
         $app = New-Object -ComObject '{prog_id}'; \
         $app.Quit()"
    )
}

fn host_script(prog_id: &str, process: &str) -> String {
    format!(
        r#"$ErrorActionPreference = 'Stop'
[Console]::InputEncoding = [System.Text.Encoding]::UTF8
[Console]::OutputEncoding = [System.Text.Encoding]::UTF8
$before = @(Get-Process -Name '{process}' -ErrorAction SilentlyContinue | ForEach-Object {{ $_.Id }})
$app = New-Object -ComObject '{prog_id}'
$appPid = Get-Process -Name '{process}' -ErrorAction SilentlyContinue |
    Where-Object {{ $before -notcontains $_.Id }} |
    Select-Object -First 1 -ExpandProperty Id
if ($null -eq $appPid) {{ $appPid = 0 }}
try {{
    $app.Visible = $false
    $app.DisplayAlerts = 0
    [Console]::Out.WriteLine('{READY} ' + $appPid)
    [Console]::Out.Flush()
    while ($null -ne ($line = [Console]::In.ReadLine())) {{
        $parts = $line -split "`t"
        try {{
            $doc = $app.Documents.Open($parts[0], $false, $true)
            try {{
                $doc.SaveAs([ref]$parts[1], [ref]{FORMAT_PDF})
            }} finally {{
                $doc.Close([ref]0)
            }}
            [Console]::Out.WriteLine('OK')
        }} catch {{
            [Console]::Out.WriteLine('ERR ' + ($_.Exception.Message -replace "`r?`n", ' '))
        }}
        [Console]::Out.Flush()
    }}
}} finally {{
    $app.Quit()
    [void][System.Runtime.InteropServices.Marshal]::ReleaseComObject($app)
}}
"#
    )
}
