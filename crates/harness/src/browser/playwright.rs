//! Playwright browser automation
//!
//! Each session is a `node` child process running a generated bridge
//! script. The bridge owns one browser, one context and one page, and
//! answers newline-delimited JSON commands on stdin:
//!
//! ```text
//! -> {"id":3,"op":"click","target":[{"kind":"css","value":"#login-button"}]}
//! <- {"id":3,"ok":true,"value":null}
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::browser::{BrowserLauncher, BrowserSession, Selector};
use crate::config::BrowserConfig;
use crate::error::{HarnessError, HarnessResult};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Launches Playwright-backed sessions
pub struct PlaywrightLauncher {
    config: BrowserConfig,
    script: String,
}

impl PlaywrightLauncher {
    /// Create a launcher, verifying that Playwright can be resolved
    pub fn new(config: BrowserConfig) -> HarnessResult<Self> {
        Self::check_playwright_installed(&config.node_binary)?;
        let script = build_bridge_script(&config);
        Ok(Self { config, script })
    }

    /// Check that `require('playwright')` resolves from the working directory
    fn check_playwright_installed(node_binary: &str) -> HarnessResult<()> {
        let status = Command::new(node_binary)
            .args(["-e", "require.resolve('playwright')"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(HarnessError::PlaywrightNotFound),
        }
    }
}

#[async_trait]
impl BrowserLauncher for PlaywrightLauncher {
    async fn open(&self) -> HarnessResult<Arc<dyn BrowserSession>> {
        let mut child = TokioCommand::new(&self.config.node_binary)
            .arg("-e")
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HarnessError::collaborator(format!("failed to spawn {}: {e}", self.config.node_binary)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HarnessError::collaborator("bridge stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HarnessError::collaborator("bridge stdout unavailable"))?;

        // Forward bridge diagnostics to the log
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "plancheck::playwright", "{}", line);
                }
            });
        }

        let mut stdout = BufReader::new(stdout).lines();
        let ready = tokio::time::timeout(STARTUP_TIMEOUT, stdout.next_line())
            .await
            .map_err(|_| HarnessError::Timeout {
                what: "Playwright browser launch".into(),
                ms: STARTUP_TIMEOUT.as_millis() as u64,
            })??;

        match ready.as_deref().map(serde_json::from_str::<Value>) {
            Some(Ok(value)) if value["ready"] == json!(true) => {}
            other => {
                return Err(HarnessError::collaborator(format!(
                    "Playwright bridge did not become ready: {other:?}"
                )))
            }
        }

        info!(browser = self.config.kind.as_str(), headless = self.config.headless, "Browser session opened");

        Ok(Arc::new(PlaywrightSession {
            io: Mutex::new(BridgeIo { stdin, stdout }),
            child: Mutex::new(child),
            next_id: AtomicU64::new(1),
        }))
    }
}

struct BridgeIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// A live bridge process
pub struct PlaywrightSession {
    io: Mutex<BridgeIo>,
    child: Mutex<Child>,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    /// Absent when the bridge could not read the command
    #[serde(default)]
    id: Option<u64>,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

impl PlaywrightSession {
    async fn call(&self, op: &str, mut command: Value) -> HarnessResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        command["id"] = json!(id);
        command["op"] = json!(op);

        let mut line = serde_json::to_string(&command)?;
        line.push('\n');

        let mut io = self.io.lock().await;
        io.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| HarnessError::collaborator(format!("Playwright bridge closed: {e}")))?;
        io.stdin.flush().await?;

        // A call dropped by a timeout leaves its reply in the pipe
        let reply = loop {
            let line = io
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| HarnessError::collaborator(format!("Playwright bridge exited during '{op}'")))?;
            let reply: BridgeReply = serde_json::from_str(&line)?;
            match reply.id {
                Some(seen) if seen < id => {
                    debug!(seen, pending = id, "Discarding reply to an abandoned bridge request");
                }
                Some(seen) if seen == id => break reply,
                Some(seen) => {
                    return Err(HarnessError::collaborator(format!(
                        "Playwright bridge answered request {seen} while {id} was pending"
                    )))
                }
                None => {
                    return Err(HarnessError::collaborator(format!(
                        "Playwright bridge rejected a command: {}",
                        reply.error.unwrap_or_else(|| "unknown error".into())
                    )))
                }
            }
        };

        if reply.ok {
            Ok(reply.value)
        } else {
            Err(HarnessError::collaborator(format!(
                "Playwright {op} failed: {}",
                reply.error.unwrap_or_else(|| "unknown error".into())
            )))
        }
    }
}

#[async_trait]
impl BrowserSession for PlaywrightSession {
    async fn goto(&self, url: &str) -> HarnessResult<()> {
        self.call("goto", json!({ "url": url })).await.map(|_| ())
    }

    async fn fill(&self, target: &Selector, value: &str) -> HarnessResult<()> {
        self.call("fill", json!({ "target": target, "value": value })).await.map(|_| ())
    }

    async fn click(&self, target: &Selector) -> HarnessResult<()> {
        self.call("click", json!({ "target": target })).await.map(|_| ())
    }

    async fn current_url(&self) -> HarnessResult<String> {
        match self.call("url", json!({})).await? {
            Value::String(url) => Ok(url),
            other => Err(HarnessError::collaborator(format!("unexpected URL value {other}"))),
        }
    }

    async fn text_content(&self, target: &Selector) -> HarnessResult<Option<String>> {
        match self.call("text_content", json!({ "target": target })).await? {
            Value::String(text) => Ok(Some(text)),
            Value::Null => Ok(None),
            other => Err(HarnessError::collaborator(format!("unexpected text value {other}"))),
        }
    }

    async fn is_visible(&self, target: &Selector) -> HarnessResult<bool> {
        self.call("is_visible", json!({ "target": target }))
            .await?
            .as_bool()
            .ok_or_else(|| HarnessError::collaborator("is_visible returned a non-boolean"))
    }

    async fn count(&self, target: &Selector) -> HarnessResult<usize> {
        self.call("count", json!({ "target": target }))
            .await?
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| HarnessError::collaborator("count returned a non-number"))
    }

    async fn close(&self) -> HarnessResult<()> {
        if let Err(e) = self.call("close", json!({})).await {
            warn!("Browser did not close cleanly: {}", e);
        }
        let mut child = self.child.lock().await;
        match tokio::time::timeout(Duration::from_secs(5), child.wait()).await {
            Ok(_) => Ok(()),
            Err(_) => {
                child.kill().await?;
                Ok(())
            }
        }
    }
}

/// Generate the bridge program for a browser configuration.
///
/// Only trusted configuration values are interpolated; selectors and
/// input values travel over stdin as JSON.
pub fn build_bridge_script(config: &BrowserConfig) -> String {
    format!(
        r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const readline = require('readline');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  context.setDefaultTimeout({action_timeout});
  const page = await context.newPage();

  const resolve = (parts) => {{
    let loc = null;
    for (const part of parts) {{
      switch (part.kind) {{
        case 'css': loc = loc ? loc.locator(part.value) : page.locator(part.value); break;
        case 'first': loc = loc.first(); break;
        case 'nth': loc = loc.nth(part.value); break;
        case 'has_text': loc = loc.filter({{ hasText: part.value }}); break;
        default: throw new Error('unknown selector part ' + part.kind);
      }}
    }}
    return loc;
  }};

  const handlers = {{
    goto: async (c) => {{ await page.goto(c.url); return null; }},
    fill: async (c) => {{ await resolve(c.target).fill(c.value); return null; }},
    click: async (c) => {{ await resolve(c.target).click(); return null; }},
    url: async () => page.url(),
    text_content: async (c) => {{
      const loc = resolve(c.target);
      if ((await loc.count()) === 0) return null;
      return await loc.textContent();
    }},
    is_visible: async (c) => await resolve(c.target).isVisible(),
    count: async (c) => await resolve(c.target).count(),
    close: async () => {{ await browser.close(); return null; }},
  }};

  const send = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');
  send({{ ready: true }});

  const rl = readline.createInterface({{ input: process.stdin }});
  for await (const line of rl) {{
    if (!line.trim()) continue;
    let cmd = null;
    try {{
      cmd = JSON.parse(line);
      const handler = handlers[cmd.op];
      if (!handler) throw new Error('unknown op ' + cmd.op);
      const value = await handler(cmd);
      send({{ id: cmd.id, ok: true, value: value === undefined ? null : value }});
    }} catch (error) {{
      send({{ id: cmd ? cmd.id : null, ok: false, error: error.message }});
    }}
    if (cmd && cmd.op === 'close') break;
  }}
  process.exit(0);
}})().catch((error) => {{
  process.stderr.write(String(error && error.stack || error) + '\n');
  process.exit(1);
}});
"#,
        browser = config.kind.as_str(),
        headless = config.headless,
        width = config.viewport_width,
        height = config.viewport_height,
        action_timeout = config.action_timeout_ms,
    )
}
