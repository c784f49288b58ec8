//! Interactive REPL that drives an in-process dispatcher.
//!
//! Launch with `workboard-mcp repl`. Type `/help` for available commands,
//! Tab to complete commands and capability ids.

use std::sync::Arc;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};
use serde_json::{json, Value};
use tokio::runtime::Handle;

use crate::protocol::ProtocolHandler;
use crate::registry::CapabilityKind;
use crate::server::McpServer;
use crate::types::{JsonRpcMessage, JsonRpcRequest, RequestId};

const COMMANDS: &[(&str, &str)] = &[
    ("/resources", "List resources"),
    ("/tools", "List tools"),
    ("/prompts", "List prompts"),
    ("/read", "Read a resource: /read <id> [json params]"),
    ("/call", "Call a tool: /call <name> [json arguments]"),
    ("/prompt", "Show a prompt: /prompt <id>"),
    ("/stats", "Show rate budget and cache statistics"),
    ("/session", "Show the current session"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

struct WorkboardHelper {
    resources: Vec<String>,
    tools: Vec<String>,
    prompts: Vec<String>,
}

impl WorkboardHelper {
    fn new(server: &McpServer) -> Self {
        let ids = |kind| {
            server
                .registry()
                .list(kind)
                .map(|d| d.id.clone())
                .collect::<Vec<_>>()
        };
        Self {
            resources: ids(CapabilityKind::Resource),
            tools: ids(CapabilityKind::Tool),
            prompts: ids(CapabilityKind::Prompt),
        }
    }
}

impl Completer for WorkboardHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        let Some((cmd, rest)) = input.split_once(' ') else {
            let matches = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        };

        let ids = match cmd {
            "/read" => &self.resources,
            "/call" => &self.tools,
            "/prompt" => &self.prompts,
            _ => return Ok((pos, Vec::new())),
        };
        if rest.contains(' ') {
            return Ok((pos, Vec::new()));
        }
        let matches = ids
            .iter()
            .filter(|id| id.starts_with(rest))
            .map(|id| Pair {
                display: id.clone(),
                replacement: format!("{id} "),
            })
            .collect();
        Ok((input.len() - rest.len(), matches))
    }
}

impl Hinter for WorkboardHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|(cmd, _)| cmd.starts_with(line) && *cmd != line)
            .map(|(cmd, _)| cmd[line.len()..].to_string())
    }
}

impl Highlighter for WorkboardHelper {}
impl Validator for WorkboardHelper {}
impl Helper for WorkboardHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Sends requests to the dispatcher from a blocking thread.
struct ReplSession {
    handler: ProtocolHandler,
    runtime: Handle,
    next_id: i64,
}

impl ReplSession {
    fn request(&mut self, method: &str, params: Option<Value>) -> Value {
        self.next_id += 1;
        let request = JsonRpcRequest::new(RequestId::Number(self.next_id), method, params);
        self.runtime
            .block_on(self.handler.handle_message(JsonRpcMessage::Request(request)))
            .unwrap_or(Value::Null)
    }

    fn print(&mut self, method: &str, params: Option<Value>) {
        let response = self.request(method, params);
        if let Some(error) = response.get("error") {
            eprintln!(
                "  \x1b[31merror\x1b[0m {}: {}",
                error["kind"].as_str().unwrap_or("Error"),
                error["message"].as_str().unwrap_or("")
            );
            if let Some(data) = error.get("data") {
                eprintln!("{}", indent(data));
            }
            return;
        }
        eprintln!("{}", indent(&response["result"]));
    }
}

fn indent(value: &Value) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_default()
        .lines()
        .map(|l| format!("    {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split `<id> [json]` into the id and a parsed JSON object.
fn parse_target(args: &str) -> Result<(String, Value), String> {
    let (id, rest) = args.split_once(' ').unwrap_or((args, ""));
    if id.is_empty() {
        return Err("missing capability id".to_string());
    }
    let params = if rest.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str::<Value>(rest.trim()).map_err(|e| format!("invalid JSON: {e}"))?
    };
    if !params.is_object() {
        return Err("parameters must be a JSON object".to_string());
    }
    Ok((id.to_string(), params))
}

/// Run the REPL. Must be called off the async runtime, e.g. from
/// `spawn_blocking`, with a handle to that runtime.
pub fn run(server: Arc<McpServer>, runtime: Handle) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mworkboard-mcp v{}\x1b[0m \x1b[90m(project boards over MCP)\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<WorkboardHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(WorkboardHelper::new(&server)));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".workboard_mcp_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let mut session = ReplSession {
        handler: ProtocolHandler::new(server),
        runtime,
        next_id: 0,
    };
    let init = session.request(
        "initialize",
        Some(json!({
            "clientInfo": {"name": "workboard-repl", "version": env!("CARGO_PKG_VERSION")}
        })),
    );
    if let Some(error) = init.get("error") {
        anyhow::bail!("initialize failed: {}", error["message"]);
    }

    let prompt = " \x1b[36mworkboard>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
                let args = args.trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "resources" => session.print("resources/list", None),
                    "tools" => session.print("tools/list", None),
                    "prompts" => session.print("prompts/list", None),
                    "read" => match parse_target(args) {
                        Ok((id, params)) => session.print(
                            "resources/read",
                            Some(json!({"uri": id, "arguments": params})),
                        ),
                        Err(e) => eprintln!("  Usage: /read <id> [json params] ({e})"),
                    },
                    "call" => match parse_target(args) {
                        Ok((name, arguments)) => session.print(
                            "tools/call",
                            Some(json!({"name": name, "arguments": arguments})),
                        ),
                        Err(e) => eprintln!("  Usage: /call <name> [json arguments] ({e})"),
                    },
                    "prompt" => match parse_target(args) {
                        Ok((id, _)) => session.print("prompts/get", Some(json!({"name": id}))),
                        Err(e) => eprintln!("  Usage: /prompt <id> ({e})"),
                    },
                    "stats" => cmd_stats(&session),
                    "session" => match session.handler.session() {
                        Some(s) => eprintln!("{}", indent(&json!(s))),
                        None => eprintln!("  No active session"),
                    },
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    session.handler.close();
    if let Some(parent) = hist_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Tip: Tab completes commands and capability ids.");
    eprintln!();
}

fn cmd_stats(session: &ReplSession) {
    let server = session.handler.server();
    let stats = json!({
        "rateLimit": server.limiter().snapshot(),
        "cache": server.cache().stats(),
    });
    eprintln!("{}", indent(&stats));
}
