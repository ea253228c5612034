use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::db::CredentialKind;
use crate::handlers::{
    add_tag, adjust_weight, analyze_image, clear_key, edit_module, format_modules,
    generate_image, hide_tag, list_images, navigate_images, refine_modules, remove_image,
    remove_tag, save_history_image, select_image, set_key, show_keys, show_prompt,
    show_settings, show_system_info, toggle_lock, update_settings, App, HistoryStep,
    SettingsChange,
};
use crate::model::{EngineType, ModuleName};
use crate::sse::StreamEvent;
use crate::state::AppState;

/// Prompt editor for image generation backends.
#[derive(Parser, Debug)]
#[command(name = "voidweaver", version)]
pub struct Cli {
    /// Session file holding modules, settings and history
    #[arg(long, env = "VOIDWEAVER_SESSION")]
    pub session: Option<PathBuf>,

    /// Edit tags as comma separated text instead of one per line
    #[arg(long, global = true)]
    pub comma: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Break an image down into prompt modules.
    Analyze {
        /// Image file; reuses the previously loaded image when omitted
        image: Option<PathBuf>,
    },
    /// Show all modules and their tags.
    Show,
    /// Print the assembled prompt.
    Prompt {
        /// Plain tags without weights
        #[arg(long)]
        raw: bool,
    },
    /// Replace a module's tags with edited text ("-" reads stdin).
    Edit { module: ModuleName, text: String },
    /// Append a tag, e.g. "1.5::red eyes::".
    Add { module: ModuleName, tag: String },
    /// Delete the tag on a line.
    Remove { module: ModuleName, line: usize },
    /// Hide the tag on a line from the editor. It stays in the prompt.
    Hide { module: ModuleName, line: usize },
    /// Bring every hidden tag of a module back into the editor.
    Unhide { module: ModuleName },
    /// Toggle whether refinement may change a module.
    Lock { module: ModuleName },
    /// Raise or lower the weight of the tag on a line.
    Weight {
        module: ModuleName,
        line: usize,
        #[arg(long, conflicts_with = "down")]
        up: bool,
        #[arg(long)]
        down: bool,
    },
    /// Rewrite unlocked modules following a natural-language instruction.
    Refine {
        #[arg(required = true, num_args = 1..)]
        instruction: Vec<String>,
    },
    /// Generate an image from the current prompt.
    Generate {
        /// Use the event stream and print progress
        #[arg(long)]
        stream: bool,
        /// Write the image to this file
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Browse generated images.
    #[command(subcommand)]
    History(HistoryCommand),
    /// Show or change generation settings.
    Settings(SettingsArgs),
    /// Manage stored credentials.
    #[command(subcommand)]
    Keys(KeysCommand),
    /// Start over with empty modules and history, keeping settings.
    Reset,
    /// Show system information.
    Info,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum HistoryCommand {
    List,
    Show { position: usize },
    Prev,
    Next,
    Remove { position: usize },
    Save {
        path: PathBuf,
        #[arg(long)]
        position: Option<usize>,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct SettingsArgs {
    #[arg(long)]
    pub engine: Option<EngineType>,
    #[arg(long)]
    pub resolution: Option<String>,
    #[arg(long)]
    pub steps: Option<u32>,
    #[arg(long)]
    pub scale: Option<f64>,
    /// Img2img strength for the loaded image
    #[arg(long, conflicts_with = "no_img2img")]
    pub strength: Option<f64>,
    /// Generate from text only
    #[arg(long)]
    pub no_img2img: bool,
    #[arg(long)]
    pub deep_thinking: Option<bool>,
}

impl From<SettingsArgs> for SettingsChange {
    fn from(args: SettingsArgs) -> Self {
        let strength = match (args.strength, args.no_img2img) {
            (_, true) => Some(None),
            (Some(s), false) => Some(Some(s)),
            (None, false) => None,
        };
        Self {
            engine: args.engine,
            resolution: args.resolution,
            steps: args.steps,
            scale: args.scale,
            strength,
            deep_thinking: args.deep_thinking,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum KeysCommand {
    /// Save a credential: gemini, novelai or google.
    Set { kind: CredentialKind, value: String },
    /// List saved credentials, masked.
    Show,
    Clear { kind: CredentialKind },
}

impl Command {
    /// Whether the command can change the saved session.
    pub fn mutates_state(&self) -> bool {
        !matches!(
            self,
            Command::Show
                | Command::Prompt { .. }
                | Command::Info
                | Command::Keys(_)
                | Command::History(HistoryCommand::List)
                | Command::History(HistoryCommand::Save { .. })
        ) && !matches!(self, Command::Settings(args) if *args == SettingsArgs::default())
    }

    pub async fn dispatch(self, app: &mut App) -> Result<String> {
        tracing::debug!(command = ?self, "Dispatching command");
        match self {
            Command::Analyze { image } => analyze_image(app, image.as_deref()).await,
            Command::Show => Ok(format_modules(&app.state)),
            Command::Prompt { raw } => Ok(show_prompt(&app.state, raw)),
            Command::Edit { module, text } => {
                let text = if text == "-" { read_stdin()? } else { text };
                edit_module(app, module, &text)
            }
            Command::Add { module, tag } => add_tag(app, module, &tag),
            Command::Remove { module, line } => remove_tag(app, module, line),
            Command::Hide { module, line } => hide_tag(app, module, Some(line)),
            Command::Unhide { module } => hide_tag(app, module, None),
            Command::Lock { module } => Ok(toggle_lock(app, module)),
            Command::Weight {
                module,
                line,
                up,
                down,
            } => {
                anyhow::ensure!(up || down, "pass --up or --down");
                adjust_weight(app, module, line, up)
            }
            Command::Refine { instruction } => refine_modules(app, &instruction.join(" ")).await,
            Command::Generate { stream, out } => {
                generate_image(app, stream, out.as_deref(), print_progress).await
            }
            Command::History(cmd) => match cmd {
                HistoryCommand::List => Ok(list_images(app)),
                HistoryCommand::Show { position } => select_image(app, position),
                HistoryCommand::Prev => Ok(navigate_images(app, HistoryStep::Previous)),
                HistoryCommand::Next => Ok(navigate_images(app, HistoryStep::Next)),
                HistoryCommand::Remove { position } => remove_image(app, position),
                HistoryCommand::Save { path, position } => {
                    save_history_image(app, position, &path)
                }
            },
            Command::Settings(args) => {
                if args == SettingsArgs::default() {
                    Ok(show_settings(&app.state.settings))
                } else {
                    update_settings(app, args.into())
                }
            }
            Command::Keys(cmd) => match cmd {
                KeysCommand::Set { kind, value } => set_key(app, kind, &value).await,
                KeysCommand::Show => show_keys(app).await,
                KeysCommand::Clear { kind } => clear_key(app, kind).await,
            },
            Command::Reset => {
                let settings = app.state.settings.clone();
                app.state = AppState::new(settings);
                Ok(format_modules(&app.state))
            }
            Command::Info => Ok(show_system_info()),
        }
    }
}

fn print_progress(event: &StreamEvent) {
    match event {
        StreamEvent::Log(line) => println!("💭 {line}"),
        StreamEvent::Sketch(_) => println!("✏️  sketch received"),
        StreamEvent::Result(_) | StreamEvent::Error(_) => {}
    }
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}
