use shared::{
    domain::ReviewId,
    protocol::Embed,
    text::split_to_parts,
};
use storage::StoredReview;

pub const TEXT_PAGE_FIELD: &str = "Text page";
pub const TEXT_FIELD: &str = "Text";
pub const TEXT_PAGE_LEN: usize = 1024;
pub const LIKES_FIELD: &str = "👍";
pub const DISLIKES_FIELD: &str = "👎";

const REVIEW_COLOR: u32 = 0x3498db;
const ID_PREFIX: &str = "ID:";

fn footer(subject: &str) -> String {
    format!("Review | {}", subject.to_uppercase())
}

/// Renders one review with the `text_page`-th chunk of its text (clamped).
pub fn review_embed(review: &StoredReview, text_page: usize) -> Embed {
    let parts = split_to_parts(&review.text, TEXT_PAGE_LEN);
    let max = parts.len().max(1);
    let page = text_page.clamp(1, max);

    let mut embed = Embed::new(review.subject.to_uppercase())
        .with_color(REVIEW_COLOR)
        .with_footer(footer(&review.subject))
        .with_timestamp(review.created_at);
    embed.append_footer(&format!("{ID_PREFIX} {}", review.review_id));

    let author = if review.anonymous {
        "Anonymous"
    } else {
        review.author_name.as_str()
    };
    embed.add_field("Author", author, true);
    embed.add_field("Grade", review.tier.name(), true);
    embed.add_field("Date", review.created_at.format("%Y-%m-%d").to_string(), true);
    if max > 1 {
        embed.add_field(TEXT_PAGE_FIELD, format!("{page}/{max}"), false);
    }
    let text = parts
        .get(page - 1)
        .cloned()
        .unwrap_or_else(|| "-".to_string());
    embed.add_field(TEXT_FIELD, text, false);
    embed.add_field(LIKES_FIELD, review.likes.to_string(), true);
    embed.add_field(DISLIKES_FIELD, review.dislikes.to_string(), true);
    embed
}

pub fn no_reviews_embed(subject: &str) -> Embed {
    Embed::new(subject.to_uppercase())
        .with_color(REVIEW_COLOR)
        .with_description("No reviews yet.")
        .with_footer(footer(subject))
}

/// One page per review, or a single field-less page when there are none.
pub fn review_pages(subject: &str, reviews: &[StoredReview]) -> Vec<Embed> {
    if reviews.is_empty() {
        return vec![no_reviews_embed(subject)];
    }
    reviews
        .iter()
        .map(|review| review_embed(review, 1))
        .collect()
}

/// `(current, max)` of the inner text axis. `None` when the field is missing or malformed.
pub fn text_page(embed: &Embed) -> Option<(usize, usize)> {
    let field = embed.field(TEXT_PAGE_FIELD)?;
    let (current, max) = field.value.split_once('/')?;
    let current: usize = current.trim().parse().ok()?;
    let max: usize = max.trim().parse().ok()?;
    (1..=max).contains(&current).then_some((current, max))
}

/// Review shown on the page, read from the `ID: <n>` footer segment.
pub fn review_id(embed: &Embed) -> Option<ReviewId> {
    embed
        .footer_segments()
        .into_iter()
        .find_map(|segment| segment.strip_prefix(ID_PREFIX))
        .and_then(|id| id.trim().parse().ok())
        .map(ReviewId)
}

#[cfg(test)]
#[path = "../tests/review_render_tests.rs"]
mod tests;
