use clap::{ArgGroup, Args, Parser, Subcommand};
use serde_json::to_string_pretty;
use tracing::warn;

use scenario_graph::config::Settings;
use scenario_graph::data_source::{make_local_source, make_remote_source};
use scenario_graph::errors::Result;
use scenario_graph::graph_model::NodeId;
use scenario_graph::layout::{DotFileRenderer, GraphRenderer, RecordingRenderer};
use scenario_graph::logging::init_logging;
use scenario_graph::viewer::ViewerSession;

/// Drive a scenario viewer without a browser and print what it would draw.
#[derive(Debug, Parser)]
#[clap(name = "scenario-graph-tool", version, about)]
struct ToolOpts {
    /// Base URL of the graph database backend.  Defaults to
    /// `database.base_url` from the settings.
    #[clap(long, env = "SCENARIO_GRAPH_SERVER", conflicts_with = "data_dir")]
    server: Option<String>,

    /// Directory holding the same payloads as the backend, as JSON files.
    #[clap(long, env = "SCENARIO_GRAPH_DATA_DIR")]
    data_dir: Option<String>,

    /// TOML settings file.
    #[clap(long, env = "SCENARIO_GRAPH_CONFIG")]
    config: Option<String>,

    /// Write every rendering of the DOT text to this file instead of printing
    /// the final one to stdout.
    #[clap(long, short)]
    output: Option<String>,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the scenario names.
    Scenarios,
    /// Draw the scenario overview.
    Overview,
    /// Draw a scenario, optionally after a series of expand/collapse steps.
    Render(RenderOpts),
    /// Print the legend of a scenario as JSON.
    Legend { scenario: String },
    /// Search a scenario and print what would be highlighted as JSON.
    Filter(FilterOpts),
}

#[derive(Debug, Args)]
struct RenderOpts {
    scenario: String,

    /// Start with every aggregate collapsed.
    #[clap(long, conflicts_with = "show_all")]
    collapsed: bool,

    /// Start with every aggregate expanded.
    #[clap(long)]
    show_all: bool,

    /// `expand:<node id>` or `collapse:<node id>`, applied in order.
    #[clap(long = "step", value_parser = parse_step)]
    steps: Vec<Step>,
}

#[derive(Debug, Args)]
#[clap(group(ArgGroup::new("needle").required(true).args(["content", "details"])))]
struct FilterOpts {
    scenario: String,

    /// Match edges whose content mentions this text.
    #[clap(long)]
    content: Option<String>,

    /// Match nodes whose details mention this text.
    #[clap(long)]
    details: Option<String>,
}

#[derive(Clone, Debug)]
enum Step {
    Expand(NodeId),
    Collapse(NodeId),
}

fn parse_step(arg: &str) -> std::result::Result<Step, String> {
    match arg.split_once(':') {
        Some(("expand", id)) if !id.is_empty() => Ok(Step::Expand(id.into())),
        Some(("collapse", id)) if !id.is_empty() => Ok(Step::Collapse(id.into())),
        _ => Err(format!(
            "expected expand:<id> or collapse:<id>, got {:?}",
            arg
        )),
    }
}

fn print_dot(session: &ViewerSession, to_stdout: bool) {
    if to_stdout {
        if let Some(dot) = session.current_dot() {
            print!("{}", dot);
        }
    }
}

async fn run(opts: ToolOpts) -> Result<()> {
    let mut settings = match &opts.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Command::Render(render) = &opts.cmd {
        if render.collapsed {
            settings.graph.show_nodes = false;
        } else if render.show_all {
            settings.graph.show_nodes = true;
        }
    }

    let source = match (&opts.data_dir, &opts.server) {
        (Some(dir), _) => make_local_source(dir)?,
        (None, Some(server)) => make_remote_source(server)?,
        (None, None) => make_remote_source(&settings.database.base_url)?,
    };
    let renderer: Box<dyn GraphRenderer> = match &opts.output {
        Some(path) => Box::new(DotFileRenderer::new(path)),
        None => Box::new(RecordingRenderer::new()),
    };
    let to_stdout = opts.output.is_none();
    let mut session = ViewerSession::new(settings, source, renderer);

    match opts.cmd {
        Command::Scenarios => {
            for name in session.source().scenario_names().await? {
                println!("{}", name);
            }
        }
        Command::Overview => {
            session.open_overview().await?;
            print_dot(&session, to_stdout);
        }
        Command::Render(render) => {
            session.open_scenario(&render.scenario).await?;
            for step in render.steps {
                let outcome = match &step {
                    Step::Expand(id) => session.expand(id)?,
                    Step::Collapse(id) => session.collapse(id)?,
                };
                if !outcome.changed {
                    warn!(step = ?step, "step changed nothing");
                }
                for failure in outcome.failures {
                    eprintln!("{:?}: {}", step, failure);
                }
            }
            print_dot(&session, to_stdout);
        }
        Command::Legend { scenario } => {
            session.open_scenario(&scenario).await?;
            println!("{}", to_string_pretty(&session.legend()?)?);
        }
        Command::Filter(filter) => {
            session.open_scenario(&filter.scenario).await?;
            let json = match (&filter.content, &filter.details) {
                (Some(content), _) => to_string_pretty(&session.filter_edges_by_content(content)?)?,
                (None, Some(details)) => to_string_pretty(&session.filter_nodes_by_details(details)?)?,
                (None, None) => to_string_pretty(&serde_json::Value::Null)?,
            };
            println!("{}", json);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    let opts = ToolOpts::parse();
    if let Err(err) = run(opts).await {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

#[test]
fn test_parse_step() {
    assert!(matches!(parse_step("expand:1"), Ok(Step::Expand(id)) if id.as_str() == "1"));
    assert!(matches!(parse_step("collapse:7"), Ok(Step::Collapse(id)) if id.as_str() == "7"));
    assert!(parse_step("expand:").is_err());
    assert!(parse_step("shrink:1").is_err());
}
