use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use shared::domain::{Semester, Tier, UserId};
use storage::{Storage, StoredSubject};
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/reviews.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    AddSubject {
        shortcut: String,
        name: String,
        /// P, PVT, PVA or V
        kind: String,
        /// Z (winter) or L (summer)
        semester: String,
        #[arg(long)]
        degree: Option<String>,
        #[arg(long)]
        year: Option<String>,
    },
    AddReview {
        member_id: i64,
        author_name: String,
        subject: String,
        grade: String,
        text: String,
        #[arg(long)]
        anonymous: bool,
    },
    RemoveReview {
        member_id: i64,
        subject: String,
    },
    ListReviews {
        subject: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::AddSubject {
            shortcut,
            name,
            kind,
            semester,
            degree,
            year,
        } => {
            let semester = Semester::from_code(&semester)
                .ok_or_else(|| anyhow!("semester must be Z or L, got '{semester}'"))?;
            storage
                .upsert_subject(&StoredSubject {
                    shortcut: shortcut.clone(),
                    name,
                    kind: kind.to_uppercase(),
                    semester,
                    degree,
                    year,
                })
                .await?;
            info!(%shortcut, "subject stored");
        }
        Command::AddReview {
            member_id,
            author_name,
            subject,
            grade,
            text,
            anonymous,
        } => {
            let tier = Tier::parse(&grade).ok_or_else(|| anyhow!("grade must be A-F, got '{grade}'"))?;
            let review_id = storage
                .add_review(UserId(member_id), &author_name, &subject, tier, anonymous, &text)
                .await?
                .ok_or_else(|| anyhow!("unknown subject '{subject}'"))?;
            println!("stored review_id={review_id}");
        }
        Command::RemoveReview { member_id, subject } => {
            let removed = storage.remove_review(UserId(member_id), &subject).await?;
            println!("removed={removed}");
        }
        Command::ListReviews { subject } => {
            for review in storage.reviews_for_subject(&subject.to_lowercase()).await? {
                println!(
                    "{}\t{}\t{}\t+{}/-{}",
                    review.review_id,
                    review.author_name,
                    review.tier.name(),
                    review.likes,
                    review.dislikes
                );
            }
        }
    }

    Ok(())
}
