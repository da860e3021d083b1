//! Command line surface.
//!
//! Parsing is done with clap. Requests are validated here, before the
//! service runs, so that malformed invocations fail without touching any
//! file. Results go to stdout and failures to stderr, both through the
//! formatter picked by `--json`.

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{Error, ErrorCode, Result};
use crate::model::{
    BatchRequest, ExecOptions, Field, IoOptions, MetadataPatch, SetRequest, ShowRequest,
    TemplateApplyRequest, TemplateSaveRequest, UnsetRequest,
};
use crate::output::{formatter, parse_format, Formatter};
use crate::service::{MetadataService, Service};
use crate::validate;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

/// Read and edit PDF metadata.
#[derive(Debug, Parser)]
#[command(name = "pdfmeta", about, version)]
pub struct Cli {
    /// Template store file (defaults to $PDFMETA_TEMPLATE_STORE, then ~/.pdfmeta/templates.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub template_store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show metadata from a PDF
    Show {
        /// Input PDF file
        #[arg(long)]
        file: String,

        /// Emit result JSON
        #[arg(long)]
        json: bool,
    },

    /// Set metadata fields
    Set {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        patch: PatchFields,
    },

    /// Unset metadata fields
    Unset {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        fields: UnsetArgs,
    },

    /// Apply metadata operations to many PDFs
    Batch {
        /// Path to batch manifest file
        #[arg(long)]
        manifest: String,

        /// Continue processing after individual file failures
        #[arg(long)]
        continue_on_error: bool,

        /// Reject invalid metadata instead of auto-correcting
        #[arg(long)]
        strict: bool,

        /// Emit result JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage saved metadata templates
    #[command(subcommand)]
    Template(TemplateCommands),
}

/// `template` subcommands.
#[derive(Debug, Subcommand)]
pub enum TemplateCommands {
    /// Save a template
    Save {
        /// Template name
        #[arg(long)]
        name: String,

        /// Template description
        #[arg(long, default_value = "")]
        note: String,

        /// Overwrite existing template
        #[arg(long)]
        force: bool,

        /// Emit result JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        patch: PatchFields,
    },

    /// Apply a template
    Apply {
        /// Template name
        #[arg(long)]
        name: String,

        #[command(flatten)]
        io: IoArgs,
    },

    /// List templates
    List {
        /// Emit result JSON
        #[arg(long)]
        json: bool,
    },

    /// Show template
    Show {
        /// Template name
        #[arg(long)]
        name: String,

        /// Emit result JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete template
    Delete {
        /// Template name
        #[arg(long)]
        name: String,

        /// Delete without confirmation
        #[arg(long)]
        force: bool,

        /// Emit result JSON
        #[arg(long)]
        json: bool,
    },
}

/// Input, destination and execution flags shared by write commands.
#[derive(Debug, Clone, Args)]
pub struct IoArgs {
    /// Input PDF file
    #[arg(long)]
    pub file: String,

    /// Output PDF file
    #[arg(long, default_value = "")]
    pub out: String,

    /// Modify file in place using safe atomic replace
    #[arg(long)]
    pub in_place: bool,

    /// Reject invalid metadata instead of auto-correcting
    #[arg(long)]
    pub strict: bool,

    /// Emit result JSON
    #[arg(long)]
    pub json: bool,
}

impl IoArgs {
    fn io(&self) -> IoOptions {
        IoOptions {
            input_path: self.file.clone(),
            output_path: self.out.clone(),
            in_place: self.in_place,
        }
    }

    fn exec(&self) -> ExecOptions {
        ExecOptions {
            strict: self.strict,
            json: self.json,
        }
    }
}

/// One optional value per metadata field. Only flags that are given become
/// patch entries.
#[derive(Debug, Clone, Default, Args)]
pub struct PatchFields {
    /// Title
    #[arg(long)]
    pub title: Option<String>,

    /// Author
    #[arg(long)]
    pub author: Option<String>,

    /// Subject
    #[arg(long)]
    pub subject: Option<String>,

    /// Keywords
    #[arg(long)]
    pub keywords: Option<String>,

    /// Creator
    #[arg(long)]
    pub creator: Option<String>,

    /// Producer
    #[arg(long)]
    pub producer: Option<String>,

    /// Creation date
    #[arg(long)]
    pub creation_date: Option<String>,

    /// Modification date
    #[arg(long)]
    pub mod_date: Option<String>,
}

impl PatchFields {
    /// Patch holding exactly the given flags.
    pub fn to_patch(&self) -> MetadataPatch {
        MetadataPatch {
            title: self.title.clone(),
            author: self.author.clone(),
            subject: self.subject.clone(),
            keywords: self.keywords.clone(),
            creator: self.creator.clone(),
            producer: self.producer.clone(),
            creation_date: self.creation_date.clone(),
            mod_date: self.mod_date.clone(),
        }
    }
}

/// `unset` field selection.
#[derive(Debug, Clone, Default, Args)]
pub struct UnsetArgs {
    /// Unset all supported metadata fields
    #[arg(long)]
    pub all: bool,

    /// Unset Title
    #[arg(long)]
    pub title: bool,

    /// Unset Author
    #[arg(long)]
    pub author: bool,

    /// Unset Subject
    #[arg(long)]
    pub subject: bool,

    /// Unset Keywords
    #[arg(long)]
    pub keywords: bool,

    /// Unset Creator
    #[arg(long)]
    pub creator: bool,

    /// Unset Producer
    #[arg(long)]
    pub producer: bool,

    /// Unset Creation date
    #[arg(long)]
    pub creation_date: bool,

    /// Unset Modification date
    #[arg(long)]
    pub mod_date: bool,
}

impl UnsetArgs {
    /// Selected fields in canonical order.
    pub fn fields(&self) -> Vec<Field> {
        [
            (self.title, Field::Title),
            (self.author, Field::Author),
            (self.subject, Field::Subject),
            (self.keywords, Field::Keywords),
            (self.creator, Field::Creator),
            (self.producer, Field::Producer),
            (self.creation_date, Field::CreationDate),
            (self.mod_date, Field::ModDate),
        ]
        .into_iter()
        .filter_map(|(on, field)| on.then_some(field))
        .collect()
    }
}

impl Commands {
    /// Whether output should be JSON.
    pub fn json(&self) -> bool {
        match self {
            Commands::Show { json, .. } | Commands::Batch { json, .. } => *json,
            Commands::Set { io, .. } | Commands::Unset { io, .. } => io.json,
            Commands::Template(cmd) => match cmd {
                TemplateCommands::Apply { io, .. } => io.json,
                TemplateCommands::Save { json, .. }
                | TemplateCommands::List { json }
                | TemplateCommands::Show { json, .. }
                | TemplateCommands::Delete { json, .. } => *json,
            },
        }
    }
}

impl Cli {
    /// Runtime configuration for this invocation.
    pub fn config(&self) -> Config {
        let config = Config::from_env();
        match &self.template_store {
            Some(path) => config.with_template_store(path),
            None => config,
        }
    }
}

/// Parse `args`, build the file-backed service and run. Returns the exit
/// status.
pub fn run_from_args<I, T>(args: I, stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let rendered = e.render().to_string();
            if e.use_stderr() {
                let _ = stderr.write_all(rendered.as_bytes());
                return ErrorCode::Usage.exit_code();
            }
            let _ = stdout.write_all(rendered.as_bytes());
            return 0;
        },
    };

    let service = MetadataService::from_config(&cli.config());
    run(&cli, &service, &CancelToken::new(), stdout, stderr)
}

/// Run a parsed command against `service`. Returns the exit status.
pub fn run<S: Service + ?Sized>(
    cli: &Cli,
    service: &S,
    cancel: &CancelToken,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    let fmt = formatter(parse_format(cli.command.json()));
    match execute(&cli.command, service, cancel, fmt.as_ref(), stdout) {
        Ok(()) => 0,
        Err(err) => {
            log::debug!("command failed: {:?}", err);
            let rendered = fmt
                .error(&err)
                .unwrap_or_else(|_| format!("error[{}]: {}\n", err.code, err).into_bytes());
            let _ = stderr.write_all(&rendered);
            err.code.exit_code()
        },
    }
}

fn execute<S: Service + ?Sized>(
    command: &Commands,
    service: &S,
    cancel: &CancelToken,
    fmt: &dyn Formatter,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Commands::Show { file, json } => {
            let req = ShowRequest {
                input_path: file.clone(),
                json: *json,
            };
            validate::show_request(&req)?;
            let result = service.show(cancel, &req)?;
            emit(out, fmt.show(&result)?)
        },
        Commands::Set { io, patch } => {
            let req = SetRequest {
                io: io.io(),
                exec: io.exec(),
                changes: patch.to_patch(),
            };
            validate::set_request(&req)?;
            let result = service.set(cancel, &req)?;
            emit(out, fmt.show(&result)?)
        },
        Commands::Unset { io, fields } => {
            let req = UnsetRequest {
                io: io.io(),
                exec: io.exec(),
                fields: fields.fields(),
                all: fields.all,
            };
            validate::unset_request(&req)?;
            let result = service.unset(cancel, &req)?;
            emit(out, fmt.show(&result)?)
        },
        Commands::Batch {
            manifest,
            continue_on_error,
            strict,
            json,
        } => {
            let req = BatchRequest {
                manifest_path: manifest.clone(),
                continue_on_error: *continue_on_error,
                strict: *strict,
                json: *json,
            };
            let outcome = service.batch(cancel, &req);
            if outcome.result.total > 0 {
                emit(out, fmt.batch(&outcome.result)?)?;
            }
            outcome.into_result().map(|_| ())
        },
        Commands::Template(cmd) => execute_template(cmd, service, cancel, fmt, out),
    }
}

fn execute_template<S: Service + ?Sized>(
    command: &TemplateCommands,
    service: &S,
    cancel: &CancelToken,
    fmt: &dyn Formatter,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        TemplateCommands::Save {
            name,
            note,
            force,
            patch,
            ..
        } => {
            let req = TemplateSaveRequest {
                name: name.clone(),
                note: note.clone(),
                force: *force,
                metadata: patch.to_patch(),
            };
            validate::template_save_request(&req)?;
            let record = service.template_save(cancel, &req)?;
            emit(out, fmt.template(&record)?)
        },
        TemplateCommands::Apply { name, io } => {
            let req = TemplateApplyRequest {
                name: name.clone(),
                io: io.io(),
                exec: io.exec(),
            };
            validate::template_apply_request(&req)?;
            let result = service.template_apply(cancel, &req)?;
            emit(out, fmt.show(&result)?)
        },
        TemplateCommands::List { .. } => {
            let records = service.template_list(cancel)?;
            emit(out, fmt.template_list(&records)?)
        },
        TemplateCommands::Show { name, .. } => {
            let record = service.template_show(cancel, name)?;
            emit(out, fmt.template(&record)?)
        },
        TemplateCommands::Delete { name, .. } => {
            service.template_delete(cancel, name)?;
            emit(out, fmt.deleted(name.trim())?)
        },
    }
}

fn emit(out: &mut dyn Write, payload: Vec<u8>) -> Result<()> {
    out.write_all(&payload)
        .and_then(|_| out.flush())
        .map_err(|e| Error::with_cause(ErrorCode::Io, "write output", e))
}
