use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};
use screen_router::core::config::{self, ResolvedConfig};
use screen_router::{
    FactoryRegistry, NavCommand, NavOutcome, NavParam, Registry, Router, RouterEvent, Screen,
    ScreenConfig, ScreenContext,
};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(
    name = "screen-router",
    about = "Drive a screen navigation stack from a command script"
)]
struct Args {
    /// Router config file (defaults to ~/.screen-router/router.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Home screen id, overrides config and SCREEN_ROUTER_HOME
    #[arg(long)]
    home: Option<String>,

    /// Read commands from a file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,
}

/// Prints every lifecycle hook it receives.
struct TraceScreen {
    id: String,
}

impl TraceScreen {
    fn trace(&self, hook: &str, param: Option<&NavParam>) {
        match param {
            Some(p) => println!("  {}: {} {}", self.id, hook, p),
            None => println!("  {}: {}", self.id, hook),
        }
    }
}

impl Screen for TraceScreen {
    fn on_create(&mut self, _cx: &mut ScreenContext) {
        self.trace("create", None);
    }
    fn on_enter(&mut self, cx: &mut ScreenContext, param: Option<&NavParam>) {
        self.trace("enter", param);
        cx.set_label("title", self.id.clone());
    }
    fn on_pause(&mut self, _cx: &mut ScreenContext) {
        self.trace("pause", None);
    }
    fn on_resume(&mut self, _cx: &mut ScreenContext) {
        self.trace("resume", None);
    }
    fn on_refresh(&mut self, _cx: &mut ScreenContext, param: Option<&NavParam>) {
        self.trace("refresh", param);
    }
    fn on_exit(&mut self, _cx: &mut ScreenContext) {
        self.trace("exit", None);
    }
    fn on_destroy(&mut self, _cx: &mut ScreenContext) {
        self.trace("destroy", None);
    }
}

/// Used when the config file names no screens.
fn demo_screens() -> Vec<ScreenConfig> {
    vec![
        ScreenConfig::new("Home", "trace").cached(),
        ScreenConfig::new("Settings", "trace"),
        ScreenConfig::new("Audio", "trace")
            .with_parent("Settings")
            .with_slot("content")
            .persistent(),
        ScreenConfig::new("Shop", "trace"),
        ScreenConfig::new("Toast", "trace").overlay().destroy_on_deactivate(),
    ]
}

fn build_router(resolved: &ResolvedConfig) -> Router {
    let registry = if resolved.screens.is_empty() {
        info!("No screens configured, using demo registry");
        Registry::load(demo_screens())
    } else {
        resolved.registry()
    };

    let factory = FactoryRegistry::new().with_fallback(|config, _parent| {
        Ok(Box::new(TraceScreen {
            id: config.id.clone(),
        }) as Box<dyn Screen>)
    });

    let mut router =
        Router::new(registry, factory).with_default_transition(resolved.transition.clone());
    if !resolved.home.is_empty() {
        router = router.with_home(resolved.home.clone());
    }
    router
}

async fn run_script(router: &Router, input: impl AsyncBufRead + Unpin) -> std::io::Result<()> {
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command: NavCommand = match line.parse() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("? {e}");
                continue;
            }
        };

        println!("> {command}");
        match router.dispatch(command).await {
            NavOutcome::Failed(e) => println!("  failed: {e}"),
            NavOutcome::Ignored(reason) => println!("  ignored: {reason}"),
            _ => {}
        }
        println!("  stack: [{}]", router.stack_screen_ids().join(", "));
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to screen-router.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("screen-router.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match &args.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };
    let file_config = file_config.unwrap_or_else(|e| {
        warn!("{e}, falling back to defaults");
        eprintln!("warning: {e}");
        Default::default()
    });
    let resolved = config::resolve(&file_config, args.home.as_deref());

    let router = build_router(&resolved);
    info!("Screen router starting, home '{}'", router.home_screen_id());

    let _events = router.subscribe(|event: &RouterEvent| {
        log::debug!("Router event: {:?}", event);
    });

    let local = tokio::task::LocalSet::new();
    let result = local
        .run_until(async {
            if let NavOutcome::Failed(e) = router.navigate_home(None).await {
                error!("Could not show home screen: {e}");
                eprintln!("error: {e}");
            }
            println!("  stack: [{}]", router.stack_screen_ids().join(", "));

            match &args.script {
                Some(path) => {
                    let file = tokio::fs::File::open(path).await?;
                    run_script(&router, BufReader::new(file)).await
                }
                None => run_script(&router, BufReader::new(tokio::io::stdin())).await,
            }
        })
        .await;

    router.shutdown();
    result
}
