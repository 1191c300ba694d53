use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use ttv_tools::cache::QueryCache;
use ttv_tools::client::ApiClient;
use ttv_tools::config::Settings;
use ttv_tools::models::TeamListEntry;
use ttv_tools::views::{
    resolve_target, EventSubDetailView, EventSubsPage, EventSubsView, HomePage, HomeView,
    InvitesPage, InvitesView, RedeemInviteView, RedeemPage, TeamDetailView, TeamsPage, TeamsView,
    UserView,
};

/// Command-line client for the TTV tools event notification platform
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the logged-in user, or how to log in
    Me,
    /// List event subscriptions
    Eventsubs,
    /// Show one event subscription
    Eventsub { uuid: Uuid },
    /// List teams
    Teams,
    /// Show one team with its members
    Team { uuid: Uuid },
    /// Show a user profile
    User { uuid: Uuid },
    /// List open team invites
    Invites,
    /// Redeem a team invite
    Redeem { uuid: Uuid },
    /// Print the Twitch login URL
    Login,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let settings = Settings::from_env();
    info!("Using backend at {}", settings.base_url);

    let client = Arc::new(ApiClient::new(&settings).await?);
    let cache = QueryCache::new();

    match args.command {
        Command::Me => {
            match HomeView::new(client, cache).load().await? {
                HomePage::LoggedIn { user } => {
                    println!(
                        "{} ({})",
                        user.name,
                        user.login_name.as_deref().unwrap_or("-")
                    );
                    if let Some(uuid) = user.uuid {
                        println!("  uuid:     {}", uuid);
                    }
                    println!("  twitch:   {}", user.twitch_id);
                    println!(
                        "  discord:  {}",
                        if user.discord_linked() { "linked" } else { "not linked" }
                    );
                    if user.is_superadmin {
                        println!("  role:     superadmin");
                    }
                }
                HomePage::LoggedOut { login_url } => {
                    println!("Not logged in. Log in at:\n  {}", login_url);
                }
            }
        }
        Command::Eventsubs => {
            match EventSubsView::new(client, cache).load().await? {
                EventSubsPage::NotLoggedIn => println!("Not logged in."),
                EventSubsPage::FeatureUnavailable => {
                    println!("Event subscriptions are not available on this backend.")
                }
                EventSubsPage::Ready {
                    eventsubs,
                    discord_servers,
                    ..
                } => {
                    if eventsubs.is_empty() {
                        println!("No event subscriptions.");
                    }
                    for sub in &eventsubs {
                        let (server, channel) = resolve_target(sub, &discord_servers);
                        println!(
                            "{}  {}  -> {} / {}",
                            sub.uuid.map(|u| u.to_string()).unwrap_or_default(),
                            sub.event,
                            server.map(|s| s.name.as_str()).unwrap_or("?"),
                            channel.map(|c| c.name.as_str()).unwrap_or("?"),
                        );
                    }
                }
            }
        }
        Command::Eventsub { uuid } => {
            let detail = EventSubDetailView::new(client, cache, uuid).load().await?;
            println!("event:    {}", detail.eventsub.event);
            println!(
                "server:   {}",
                detail.server.map(|s| s.name).unwrap_or_else(|| "?".to_string())
            );
            println!(
                "channel:  {}",
                detail.channel.map(|c| c.name).unwrap_or_else(|| "?".to_string())
            );
            if !detail.eventsub.message.is_empty() {
                println!("message:  {}", detail.eventsub.message);
            }
        }
        Command::Teams => {
            match TeamsView::new(client, cache).load().await? {
                TeamsPage::NotLoggedIn => println!("Not logged in."),
                TeamsPage::Ready { teams, .. } => {
                    if teams.is_empty() {
                        println!("No teams.");
                    }
                    for entry in &teams {
                        match entry.team() {
                            Some(team) => println!(
                                "{}  {}",
                                team.uuid.map(|u| u.to_string()).unwrap_or_default(),
                                team.name
                            ),
                            None => {
                                if let TeamListEntry::Membership(m) = entry {
                                    println!("{}  (membership)", m.team_uuid);
                                }
                            }
                        }
                    }
                }
            }
        }
        Command::Team { uuid } => {
            let detail = TeamDetailView::new(client, cache, uuid).load().await?;
            println!("{}", detail.team.name);
            println!("  {}", detail.team.description);
            for member in &detail.members {
                let name = member
                    .user
                    .as_ref()
                    .map(|u| u.name.as_str())
                    .unwrap_or("?");
                let role = if member.is_admin { " (admin)" } else { "" };
                println!("  - {}{}", name, role);
            }
        }
        Command::User { uuid } => {
            let page = UserView::new(client, cache, uuid).load().await?;
            println!(
                "{} ({})",
                page.user.name,
                page.user.login_name.as_deref().unwrap_or("-")
            );
            if let Some(description) = page.user.description.as_deref().filter(|d| !d.is_empty()) {
                println!("  {}", description);
            }
            match page.discord {
                ttv_tools::views::DiscordLink::Linked { unlink_url } => {
                    println!("  discord: linked (unlink at {})", unlink_url)
                }
                ttv_tools::views::DiscordLink::Unlinked { link_url } => {
                    println!("  discord: not linked (link at {})", link_url)
                }
            }
        }
        Command::Invites => {
            match InvitesView::new(client, cache).load().await? {
                InvitesPage::NotLoggedIn => println!("Not logged in."),
                InvitesPage::Ready {
                    invites, invitees, ..
                } => {
                    if invites.is_empty() {
                        println!("No open invites.");
                    }
                    for invite in &invites {
                        let invitee = invitees
                            .iter()
                            .find(|u| u.id == invite.user_twitch_id)
                            .map(|u| u.display_name.as_str())
                            .unwrap_or(invite.user_twitch_id.as_str());
                        println!(
                            "{}  team {}  -> {}",
                            invite.uuid.map(|u| u.to_string()).unwrap_or_default(),
                            invite.team_uuid,
                            invitee
                        );
                    }
                }
            }
        }
        Command::Redeem { uuid } => {
            let mut view = RedeemInviteView::new(client, cache, uuid);
            match view.load().await? {
                RedeemPage::NotLoggedIn { login_url } => {
                    println!("Log in first:\n  {}", login_url);
                }
                RedeemPage::NotForYou { .. } => {
                    println!("This invite is addressed to a different Twitch account.");
                }
                RedeemPage::Ready { team, joined, .. } => {
                    if joined {
                        println!("Already redeemed.");
                    } else {
                        view.redeem().await?;
                        match team {
                            Some(team) => println!("Joined {}.", team.name),
                            None => println!("Joined."),
                        }
                    }
                }
            }
        }
        Command::Login => {
            println!("{}", client.twitch_login_url(None));
        }
    }

    Ok(())
}
