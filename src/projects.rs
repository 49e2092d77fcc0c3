// src/projects.rs
//! /projects route shape: the user's own described, non-fork repositories
//! out of their subscriptions, ranked by stars.

use serde::Serialize;

use crate::upstream::github::Subscription;

pub const MAX_PROJECTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCard {
    pub title: String,
    pub url: String,
    pub text: String,
    pub stars: u32,
}

/// Filter to repos the user owns, that are not forks, and that carry a
/// non-empty description; then keep the four lowest-starred of those,
/// presented highest first.
///
/// "Lowest four, reversed" is what the site has always shipped; whether
/// the intent was the four highest-starred is an open product question.
/// Until that call is made, the selection stays as shipped, with a real
/// star comparator behind it.
pub fn select(subscriptions: Vec<Subscription>, user: &str) -> Vec<ProjectCard> {
    let mut cards: Vec<ProjectCard> = subscriptions
        .into_iter()
        .filter(|sub| sub.owner.login == user && !sub.fork)
        .filter_map(|sub| {
            let text = sub.description.filter(|d| !d.is_empty())?;
            Some(ProjectCard {
                title: sub.name,
                url: sub.html_url,
                text,
                stars: sub.stargazers_count,
            })
        })
        .collect();

    cards.sort_by_key(|card| card.stars);
    cards.truncate(MAX_PROJECTS);
    cards.reverse();
    cards
}
