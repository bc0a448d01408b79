use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use provisioning::activation::{ActivationAction, ActivationManager, ActivationStage};
use provisioning::config::ClientConfig;
use provisioning::credentials::SessionCredentials;
use provisioning::model::{Integration, TicketFilter};
use provisioning::poller::{progress_bar, PollOutcome, PollerConfig, ProvisioningPoller};
use provisioning::{AdminApiClient, ProvisioningApi};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "orbit-admin", version, about = "Activate merchants and follow their provisioning")]
struct Cli {
    /// Backend base URL. Overrides NEXT_PUBLIC_API_URL and the config file.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Admin bearer token from a previous `login`.
    #[arg(long, global = true, env = "ORBIT_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and print a session token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List brands, optionally filtered by activation state.
    Brands {
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        #[arg(long)]
        inactive: bool,
    },
    Themes,
    Plans,
    /// Merchants waiting for activation.
    Pending,
    /// Configure and activate a merchant store.
    Activate {
        store_id: String,
        /// Business name, used for the default subdomain.
        #[arg(long)]
        name: String,
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        plan: Option<String>,
        #[arg(long)]
        subdomain: Option<String>,
        #[arg(long)]
        domain: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Enable an integration (repeatable): meta, stripe, payu, cashfree, razorpay, phonepe, analytics.
        #[arg(long = "integration")]
        integrations: Vec<Integration>,
        /// Follow provisioning after the activation is accepted.
        #[arg(long)]
        watch: bool,
    },
    /// Show the provisioning status of a store.
    Status {
        store_id: String,
        #[arg(long)]
        watch: bool,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long)]
        no_auto_refresh: bool,
    },
    /// Re-trigger a failed provisioning job.
    Retry {
        store_id: String,
        #[arg(long)]
        watch: bool,
    },
    /// Support ticket queue.
    Tickets {
        #[command(subcommand)]
        command: TicketCommands,
    },
}

#[derive(Subcommand, Debug)]
enum TicketCommands {
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        store: Option<String>,
    },
    Show {
        id: String,
    },
    Respond {
        id: String,
        message: String,
    },
    Resolve {
        id: String,
    },
    Note {
        id: String,
        note: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::load().context("failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.trim_end_matches('/').to_string();
    }

    let credentials = Arc::new(match &cli.token {
        Some(token) => SessionCredentials::with_token(token.as_str()),
        None => SessionCredentials::new(),
    });
    let client =
        AdminApiClient::new(&config.api, credentials).context("failed to build HTTP client")?;
    info!(base_url = %client.base_url(), "using admin backend");

    match cli.command {
        Commands::Login { email, password } => {
            let login = client.login(&email, &password).await.context("login failed")?;
            println!("✅ Logged in as {}", email);
            println!("export ORBIT_ADMIN_TOKEN={}", login.token);
        }
        Commands::Brands { active, inactive } => {
            let filter = match (active, inactive) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let stores = client.get_brands(filter).await.context("failed to list brands")?;
            for store in &stores {
                println!(
                    "{:<28} {:<24} {:<24} {}",
                    store.id,
                    store.name,
                    store.subdomain,
                    if store.is_active { "active" } else { "inactive" }
                );
            }
            println!("{} brand(s)", stores.len());
        }
        Commands::Themes => {
            for theme in client.get_themes().await.context("failed to list themes")? {
                println!("{:<28} {:<24} {}", theme.id, theme.name, theme.slug);
            }
        }
        Commands::Plans => {
            for plan in client.get_plans().await.context("failed to list plans")? {
                let price = plan.price.as_deref().unwrap_or("-");
                let popular = if plan.is_popular { " *" } else { "" };
                println!("{:<28} {:<20} ${}/mo{}", plan.id, plan.name, price, popular);
            }
        }
        Commands::Pending => {
            let merchants = client
                .get_pending_merchants()
                .await
                .context("failed to list pending merchants")?;
            for merchant in &merchants {
                let owner = merchant.user.as_ref().map(|u| u.email.as_str()).unwrap_or("-");
                println!("{:<28} {:<24} {}", merchant.store.id, merchant.store.name, owner);
            }
            println!("{} merchant(s) awaiting activation", merchants.len());
        }
        Commands::Activate {
            store_id,
            name,
            theme,
            plan,
            subdomain,
            domain,
            category,
            integrations,
            watch,
        } => {
            let api = Arc::new(client);
            let form = ActivationForm {
                theme,
                plan,
                subdomain,
                domain,
                category,
                integrations,
            };
            activate(Arc::clone(&api), &config, &store_id, &name, form).await?;
            if watch {
                watch_status(api, &store_id, PollerConfig::from(&config.polling)).await?;
            }
        }
        Commands::Status {
            store_id,
            watch,
            interval_ms,
            no_auto_refresh,
        } => {
            let mut poller_config = PollerConfig::from(&config.polling);
            if let Some(ms) = interval_ms.filter(|ms| *ms > 0) {
                poller_config.interval = Duration::from_millis(ms);
            }
            if no_auto_refresh {
                poller_config.auto_refresh = false;
            }

            let api = Arc::new(client);
            if watch {
                watch_status(api, &store_id, poller_config).await?;
            } else {
                let mut poller = ProvisioningPoller::new(api, store_id.as_str(), poller_config);
                poller.refresh().await;
                print!("{}", poller.state());
                if let Some(error) = &poller.state().last_error {
                    bail!("failed to fetch provisioning status: {}", error);
                }
            }
        }
        Commands::Retry { store_id, watch } => {
            let api = Arc::new(client);
            let poller_config = PollerConfig::from(&config.polling);
            let mut poller = ProvisioningPoller::new(Arc::clone(&api), store_id.as_str(), poller_config);
            poller.retry().await.context("retry failed")?;
            println!("🔁 Provisioning retry issued for {}", store_id);

            if watch {
                watch_status(api, &store_id, poller_config).await?;
            } else {
                print!("{}", poller.state());
            }
        }
        Commands::Tickets { command } => tickets(&client, command).await?,
    }

    Ok(())
}

struct ActivationForm {
    theme: Option<String>,
    plan: Option<String>,
    subdomain: Option<String>,
    domain: Option<String>,
    category: Option<String>,
    integrations: Vec<Integration>,
}

async fn activate<A: ProvisioningApi>(
    api: Arc<A>,
    config: &ClientConfig,
    store_id: &str,
    business_name: &str,
    form: ActivationForm,
) -> Result<()> {
    let mut manager = ActivationManager::new(api, config.activation.clone()).on_complete(|receipt| {
        info!(store_id = ?receipt.store_id, "activation complete");
    });

    manager.dispatch(ActivationAction::Open {
        store_id: store_id.to_string(),
        business_name: business_name.to_string(),
    });
    manager.update().await;
    if manager.state().has_errors() {
        bail!(manager.state().errors.join("; "));
    }

    if let Some(theme_id) = form.theme {
        manager.dispatch(ActivationAction::SelectTheme { theme_id });
    }
    if let Some(plan_id) = form.plan {
        manager.dispatch(ActivationAction::SelectPlan { plan_id });
    }
    if let Some(subdomain) = form.subdomain {
        manager.dispatch(ActivationAction::SetSubdomain { subdomain });
    }
    if let Some(domain) = form.domain {
        manager.dispatch(ActivationAction::SetCustomDomain { domain });
    }
    if let Some(category) = form.category {
        manager.dispatch(ActivationAction::SetCategory { category });
    }
    for integration in form.integrations {
        manager.dispatch(ActivationAction::ToggleIntegration {
            integration,
            enabled: true,
        });
    }
    manager.drain().await;

    {
        let state = manager.state();
        let theme = state.selected_theme().map(|t| t.name.as_str()).unwrap_or("-");
        let plan = state.selected_plan().map(|p| p.name.as_str()).unwrap_or("-");
        println!("🚀 Activating {} ({})", business_name, store_id);
        println!("   theme: {}  plan: {}", theme, plan);
        if !state.form.custom_domain.is_empty() {
            println!("   domain: {}", state.form.custom_domain);
        } else {
            println!("   subdomain: {}", state.form.subdomain);
        }
    }

    manager.dispatch(ActivationAction::Submit);
    manager.update().await;

    let state = manager.state();
    if !state.validation_errors.is_empty() {
        for issue in &state.validation_errors {
            println!("  🔥 {}", issue);
        }
        bail!("activation form is incomplete");
    }

    match state.stage {
        ActivationStage::Success => {
            println!("✅ {}", state.status_text);
            if let Some(receipt) = &state.receipt {
                if let Some(message) = &receipt.message {
                    println!("   {}", message);
                }
                if let Some(url) = &receipt.dashboard_url {
                    println!("   Dashboard: {}", url);
                }
                if let Some(url) = &receipt.website_url {
                    println!("   Website:   {}", provisioning::poller::website_link(url));
                }
            }
            Ok(())
        }
        _ => bail!("activation failed: {}", state.status_text),
    }
}

/// Poll until the job settles or Ctrl-C. Stopping here never cancels the backend job.
async fn watch_status<A: ProvisioningApi + 'static>(
    api: Arc<A>,
    store_id: &str,
    config: PollerConfig,
) -> Result<()> {
    let mut poller = ProvisioningPoller::new(api, store_id, config);

    let (stop_tx, stop_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop_tx.send_replace(true);
        }
    });

    let outcome = poller
        .run(stop_rx, |state| {
            if let Some(record) = state.view.record() {
                println!(
                    "{:<12} {} {}",
                    record.status.as_str(),
                    progress_bar(record.completion_percent),
                    record.current_step
                );
            }
            if let Some(error) = &state.last_error {
                if !state.needs_login {
                    warn!(%error, "status refresh failed, will try again");
                }
            }
        })
        .await;
    ctrl_c.abort();

    println!();
    print!("{}", poller.state());

    match outcome {
        PollOutcome::Stopped => println!("Stopped watching; provisioning continues on the server."),
        PollOutcome::Paused => println!("Auto-refresh is off; run `status --watch` to follow progress."),
        PollOutcome::Unavailable => bail!("could not read provisioning status for {}", store_id),
        PollOutcome::Unauthorized => {
            bail!("session expired; run `orbit-admin login` and set ORBIT_ADMIN_TOKEN again")
        }
        PollOutcome::Terminal(_) | PollOutcome::NotActivated => {}
    }
    Ok(())
}

async fn tickets(client: &AdminApiClient, command: TicketCommands) -> Result<()> {
    match command {
        TicketCommands::List { status, store } => {
            let filter = TicketFilter {
                status,
                store_id: store,
                ..TicketFilter::default()
            };
            let tickets = client.get_tickets(&filter).await.context("failed to list tickets")?;
            for ticket in &tickets {
                let store = ticket.store.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
                println!("{:<28} {:<12} {:<24} {}", ticket.id, ticket.status, store, ticket.subject);
            }
            println!("{} ticket(s)", tickets.len());
        }
        TicketCommands::Show { id } => {
            let detail = client.get_ticket(&id).await.context("failed to load ticket")?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        TicketCommands::Respond { id, message } => {
            let ticket = client
                .respond_to_ticket(&id, &message)
                .await
                .context("failed to respond to ticket")?;
            println!("✅ Response sent on {} ({})", ticket.id, ticket.status);
        }
        TicketCommands::Resolve { id } => {
            let ticket = client.resolve_ticket(&id).await.context("failed to resolve ticket")?;
            println!("✅ Ticket {} is {}", ticket.id, ticket.status);
        }
        TicketCommands::Note { id, note } => {
            let note = client
                .add_ticket_note(&id, &note)
                .await
                .context("failed to add note")?;
            println!("✅ Note {} added", note.id);
        }
    }
    Ok(())
}
