use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ecard_core::vcard::VCARD_FILE_NAME;
use ecard_core::{
    AppConfig, FormState, PreviewDocument, ProfileId, SectionBoard, SectionKind, UuidGenerator,
};
use ecard_sync::{
    InMemoryStore, LogNotifier, ProfileEditor, ProfileStore, RestStore, SaveError, SavePlan,
    SaveReport, StaticSession,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let form_arg = Arg::new("form")
        .long("form")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Form state as JSON");

    Command::new("ecard")
        .version(ecard_core::VERSION)
        .about("E-card profile builder")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("profile")
                .long("profile")
                .global(true)
                .help("Profile id (overrides config and ECARD_PROFILE_ID)"),
        )
        .arg(
            Arg::new("store-file")
                .long("store-file")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Use a local JSON file as the store instead of the hosted one"),
        )
        .subcommand(
            Command::new("plan")
                .about("Show the writes a save would issue, without writing")
                .arg(form_arg.clone()),
        )
        .subcommand(
            Command::new("save")
                .about("Reconcile a form into the store")
                .arg(form_arg.clone())
                .arg(
                    Arg::new("write-back")
                        .long("write-back")
                        .action(ArgAction::SetTrue)
                        .help("Rewrite the form file with the ids assigned by the save"),
                ),
        )
        .subcommand(
            Command::new("load")
                .about("Print the stored profile as form JSON")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write to a file instead of stdout"),
                ),
        )
        .subcommand(Command::new("create").about("Create an empty profile and print its id"))
        .subcommand(
            Command::new("vcard")
                .about("Export the contact card")
                .arg(form_arg.clone())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file (default: contact.vcf)"),
                ),
        )
        .subcommand(
            Command::new("preview")
                .about("Render the public preview")
                .arg(form_arg)
                .arg(
                    Arg::new("sections")
                        .long("sections")
                        .value_delimiter(',')
                        .help("Section order, e.g. profile,projects,social-links"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let mut config = AppConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("loading configuration")?;
    if let Some(profile) = matches
        .get_one::<String>("profile")
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
    {
        config = config.with_profile(ProfileId::new(profile));
    }
    let store_file = matches.get_one::<PathBuf>("store-file").cloned();

    match matches.subcommand() {
        Some(("plan", args)) => {
            let form = read_form(form_path(args)?)?;
            let owner = require_profile(&config)?;
            let plan = SavePlan::build(&owner, &form, &UuidGenerator);
            println!("{}", serde_json::to_string_pretty(&plan_summary(&plan))?);
        }
        Some(("save", args)) => {
            let path = form_path(args)?;
            let form = read_form(path)?;
            let owner = require_profile(&config)?;
            let backend = Backend::open(&config, store_file.as_deref())?;

            let editor = ProfileEditor::new(
                backend.store(),
                Arc::new(UuidGenerator),
                Arc::new(StaticSession::signed_in(owner)),
                Arc::new(LogNotifier),
            )
            .with_default_status(config.editor.default_project_status.clone())
            .with_form(form);

            let report = finish_save(&backend, editor.save().await)?;
            if args.get_flag("write-back") {
                write_form(path, &editor.snapshot())?;
            }
            println!(
                "saved: {} writes, {} projects, {} links ({} skipped) in {}ms",
                report.writes,
                report.projects_written,
                report.social_written,
                report.social_skipped,
                report.elapsed_ms
            );
        }
        Some(("load", args)) => {
            let owner = require_profile(&config)?;
            let backend = Backend::open(&config, store_file.as_deref())?;
            let editor = ProfileEditor::new(
                backend.store(),
                Arc::new(UuidGenerator),
                Arc::new(StaticSession::signed_in(owner)),
                Arc::new(LogNotifier),
            );
            let form = editor.load().await.context("loading profile")?;
            match args.get_one::<PathBuf>("out") {
                Some(out) => write_form(out, &form)?,
                None => println!("{}", serde_json::to_string_pretty(&form)?),
            }
        }
        Some(("create", _)) => {
            let backend = Backend::open(&config, store_file.as_deref())?;
            let store = backend.store();
            let id = ProfileEditor::create_profile(store.as_ref(), &UuidGenerator)
                .await
                .context("creating profile")?;
            backend.persist()?;
            println!("{id}");
        }
        Some(("vcard", args)) => {
            let form = read_form(form_path(args)?)?;
            let card = ecard_core::preview::contact_card(&form, &config.editor.organization);
            let out = args
                .get_one::<PathBuf>("out")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(VCARD_FILE_NAME));
            std::fs::write(&out, card.to_vcard())
                .with_context(|| format!("writing {}", out.display()))?;
            tracing::info!(path = %out.display(), "vCard written");
        }
        Some(("preview", args)) => {
            let form = read_form(form_path(args)?)?;
            let kinds = match args.get_many::<String>("sections") {
                Some(names) => parse_sections(names.map(String::as_str))?,
                None => SectionKind::ALL.to_vec(),
            };
            let board = SectionBoard::with_kinds(&kinds, &UuidGenerator);
            let preview =
                PreviewDocument::build_with_organization(&form, &board, &config.editor.organization);
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&preview)?);
            } else {
                print!("{preview}");
            }
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}

/// Hosted store, or a local JSON file loaded into memory
enum Backend {
    Remote(Arc<RestStore>),
    File {
        path: PathBuf,
        store: Arc<InMemoryStore>,
    },
}

impl Backend {
    fn open(config: &AppConfig, store_file: Option<&Path>) -> Result<Self> {
        if let Some(path) = store_file {
            let store = if path.exists() {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                InMemoryStore::restore(&serde_json::from_str(&text)?)?
            } else {
                InMemoryStore::new()
            };
            return Ok(Self::File {
                path: path.to_path_buf(),
                store: Arc::new(store),
            });
        }

        if !config.store.is_complete() {
            bail!("store URL and key are not configured; set ECARD_STORE_URL and ECARD_STORE_KEY or pass --store-file");
        }
        Ok(Self::Remote(Arc::new(RestStore::new(&config.store)?)))
    }

    fn store(&self) -> Arc<dyn ProfileStore> {
        match self {
            Self::Remote(store) => store.clone(),
            Self::File { store, .. } => store.clone(),
        }
    }

    fn persist(&self) -> Result<()> {
        if let Self::File { path, store } = self {
            std::fs::write(path, serde_json::to_string_pretty(&store.dump())?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(())
    }
}

/// Persist whatever reached the store, then surface the save outcome
///
/// A failed save keeps the writes made before the failing step.
fn finish_save(backend: &Backend, result: Result<SaveReport, SaveError>) -> Result<SaveReport> {
    backend.persist()?;
    result.context("saving profile")
}

fn form_path(args: &ArgMatches) -> Result<&Path> {
    args.get_one::<PathBuf>("form")
        .map(PathBuf::as_path)
        .context("--form is required")
}

fn require_profile(config: &AppConfig) -> Result<ProfileId> {
    config
        .profile_id
        .clone()
        .filter(|id| !id.is_blank())
        .context("no profile id; pass --profile or set ECARD_PROFILE_ID")
}

fn read_form(path: &Path) -> Result<FormState> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_form(path: &Path, form: &FormState) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(form)?)
        .with_context(|| format!("writing {}", path.display()))
}

fn parse_sections<'a>(names: impl Iterator<Item = &'a str>) -> Result<Vec<SectionKind>> {
    names
        .map(|name| {
            name.trim()
                .parse::<SectionKind>()
                .with_context(|| format!("unknown section {name:?}"))
        })
        .collect()
}

fn plan_summary(plan: &SavePlan) -> serde_json::Value {
    let collection = |c: &ecard_sync::CollectionPlan| {
        serde_json::json!({
            "table": c.table.name(),
            "upserts": c.upserts.iter().map(|p| serde_json::json!({
                "index": p.index,
                "id": p.id,
                "new": p.assigned,
            })).collect::<Vec<_>>(),
            "keep": c.kept_ids(),
            "skipped": c.skipped,
            "replaced_malformed": c.replaced_malformed,
        })
    };
    serde_json::json!({
        "profile": plan.owner.as_str(),
        "writes": plan.write_count(),
        "projects": collection(&plan.projects),
        "social_links": collection(&plan.social),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecard_core::{Categories, Project, SocialLink};

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn form_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.json");
        let form = FormState {
            about_me: "hello".into(),
            projects: vec![Project {
                categories: Categories::from("Web, IoT"),
                ..Project::default()
            }],
            ..FormState::default()
        };

        write_form(&path, &form).unwrap();
        assert_eq!(read_form(&path).unwrap(), form);
    }

    #[test]
    fn form_file_accepts_category_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.json");
        std::fs::write(
            &path,
            r#"{"projects":[{"title":"A","categories":["Web","IoT"]}]}"#,
        )
        .unwrap();

        let form = read_form(&path).unwrap();
        assert_eq!(form.projects[0].categories.normalized(), vec!["Web", "IoT"]);
        assert_eq!(form.projects[0].status, "on-hold");
    }

    #[test]
    fn sections_parse_in_order() {
        let kinds = parse_sections(["projects", "profile"].into_iter()).unwrap();
        assert_eq!(kinds, vec![SectionKind::Projects, SectionKind::Profile]);
        assert!(parse_sections(["gallery"].into_iter()).is_err());
    }

    #[test]
    fn plan_summary_counts_writes() {
        let form = FormState {
            social: vec![SocialLink {
                url: "https://a.dev".into(),
                ..SocialLink::default()
            }],
            ..FormState::default()
        };
        let plan = SavePlan::build(&ProfileId::new("p"), &form, &UuidGenerator);
        let summary = plan_summary(&plan);
        assert_eq!(summary["writes"], 6);
        assert_eq!(summary["projects"]["keep"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn file_backend_persists_created_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let backend = Backend::open(&AppConfig::default(), Some(&path)).unwrap();
        let id = ProfileEditor::create_profile(backend.store().as_ref(), &UuidGenerator)
            .await
            .unwrap();
        backend.persist().unwrap();

        let reopened = Backend::open(&AppConfig::default(), Some(&path)).unwrap();
        let Backend::File { store, .. } = reopened else {
            panic!("expected file backend");
        };
        assert_eq!(store.rows(ecard_sync::Table::Profiles)[0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn failed_save_still_persists_earlier_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let backend = Backend::open(&AppConfig::default(), Some(&path)).unwrap();
        let id = ProfileEditor::create_profile(backend.store().as_ref(), &UuidGenerator)
            .await
            .unwrap();

        let failed = finish_save(&backend, Err(SaveError::SaveInProgress));
        assert!(failed.is_err());

        let reopened = Backend::open(&AppConfig::default(), Some(&path)).unwrap();
        let Backend::File { store, .. } = reopened else {
            panic!("expected file backend");
        };
        assert_eq!(store.rows(ecard_sync::Table::Profiles)[0]["id"], id.as_str());
    }

    #[test]
    fn blank_profile_id_is_rejected() {
        let config = AppConfig::default().with_profile(ProfileId::new("   "));
        assert!(require_profile(&config).is_err());
        assert!(require_profile(&AppConfig::default().with_profile(ProfileId::new("p"))).is_ok());
    }

    #[test]
    fn remote_backend_requires_credentials() {
        assert!(Backend::open(&AppConfig::default(), None).is_err());
    }
}
