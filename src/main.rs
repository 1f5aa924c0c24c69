use std::{error::Error, path::Path, time::Duration};

use clap::Parser;
use llm::{
    chronicler::{Chronicler, ChroniclerWorker},
    gemini::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL},
    GenerativeService,
};
use sys::{
    llm::{PromptTemplate, SYSTEM_TEMPLATE},
    WorldData,
};

mod chat;
mod component;
mod debug_tool;
mod llm;
mod sys;

#[derive(Debug, clap::Parser)]
struct Args {
    #[arg(long, short, required = true)]
    project_path: String,

    /// plain stdin/stdout chat instead of the TUI
    #[arg(long)]
    plain: bool,

    /// answer offline by echoing the question
    #[arg(long)]
    echo: bool,

    #[arg(long)]
    model: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct Project {
    world_path: String,
    #[serde(default)]
    system_template: Option<String>,
    #[serde(default)]
    chronicler: ChroniclerOptions,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ChroniclerOptions {
    #[serde(default)]
    model: String,
    #[serde(default)]
    base_url: String,
    #[serde(default)]
    api_key_env: String,
    #[serde(default)]
    timeout_secs: u64,
    #[serde(default)]
    greeting: String,
}

impl ChroniclerOptions {
    fn fill_default_value(&mut self) {
        if self.model.is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }
        if self.base_url.is_empty() {
            self.base_url = DEFAULT_BASE_URL.to_string();
        }
        if self.api_key_env.is_empty() {
            self.api_key_env = "API_KEY".to_string();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = 60;
        }
        if self.greeting.is_empty() {
            self.greeting = chat::history::GREETING.to_string();
        }
    }

    /// Read once at startup; a missing key is only warned about.
    fn read_api_key(&self) -> String {
        self.api_key_from(|name| std::env::var(name).ok())
    }

    fn api_key_from(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        [self.api_key_env.as_str(), "GEMINI_API_KEY"]
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.is_empty()))
            .unwrap_or_else(|| {
                log::warn!(
                    "API key not found in environment variable `{}`",
                    self.api_key_env
                );
                String::new()
            })
    }
}

fn load_project(path: &str) -> anyhow::Result<Project> {
    let raw = std::fs::read_to_string(path)
        .map_err(|_| anyhow::anyhow!("project file `{}` not found", path))?;
    let mut project: Project = toml::from_str(&raw)?;
    project.chronicler.fill_default_value();

    // world_path is relative to the project file
    let world_path = Path::new(&project.world_path);
    if world_path.is_relative() {
        if let Some(dir) = Path::new(path).parent() {
            project.world_path = dir.join(world_path).to_string_lossy().into_owned();
        }
    }
    Ok(project)
}

fn start_worker<S: GenerativeService + 'static>(
    service: S,
    system_instruction: String,
    rx: chat::im_channel::MessageRx,
    tx: chat::im_channel::MessageTx,
) {
    let chronicler = Chronicler::new(service, system_instruction);
    // the worker exits once the front-end drops its sender
    let _ = ChroniclerWorker::new(chronicler, rx, tx).spawn();
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Args::parse();
    let mut project = load_project(&cli.project_path)?;
    if let Some(model) = cli.model {
        project.chronicler.model = model;
    }

    let world = WorldData::load(&project.world_path)?;
    let template = PromptTemplate::new(
        project
            .system_template
            .as_deref()
            .unwrap_or(SYSTEM_TEMPLATE),
    )?;
    let system_instruction = template.render(&world)?;

    let ((ui_tx, ui_rx), (worker_tx, worker_rx)) = chat::im_channel::channel();
    let options = &project.chronicler;
    if cli.echo {
        start_worker(debug_tool::EchoService, system_instruction, worker_rx, worker_tx);
    } else {
        let client = GeminiClient::new(
            options.read_api_key(),
            options.model.clone(),
            options.base_url.clone(),
            Duration::from_secs(options.timeout_secs),
        )?;
        log::info!("chronicler model: {}", client.model());
        start_worker(client, system_instruction, worker_rx, worker_tx);
    }

    let log = chat::history::ConversationLog::with_greeting(options.greeting.clone());

    let res = if cli.plain {
        debug_tool::TerminalApp {
            tx: ui_tx,
            rx: ui_rx,
            log,
        }
        .run_loop()
    } else {
        component::App::new(world, log).run_loop(ui_tx, ui_rx)
    };

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}
