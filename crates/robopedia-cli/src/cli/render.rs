//! # Rendering
//!
//! Turns records and command messages into terminal text. Every `render_*`
//! function returns a `String` so the views can be tested without a terminal;
//! the public versions detect color support, the `_internal` ones take it as an
//! argument.
//!
//! Column math is done in display width (`unicode-width`), not bytes, so names
//! like "Pepper ペッパー" keep the columns aligned.

use super::styles;
use chrono::{DateTime, Utc};
use console::Style;
use robopedia::commands::{CmdMessage, MessageLevel};
use robopedia::model::{Activity, NewsArticle, Robot, Settings, User};
use std::fmt::Display;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const LINE_WIDTH: usize = 100;
pub const ID_WIDTH: usize = 22;
pub const TIME_WIDTH: usize = 16;
pub const META_WIDTH: usize = 30;
pub const FEATURED_MARKER: &str = "★";

const LEFT_PAD: &str = "  ";

pub fn render_robot_list(robots: &[Robot]) -> String {
    render_robot_list_internal(robots, None)
}

fn render_robot_list_internal(robots: &[Robot], use_color: Option<bool>) -> String {
    if robots.is_empty() {
        return "No robots yet, add one with `robopedia robots create`\n".to_string();
    }

    // left pad, id, two gaps, meta, marker
    let title_width = LINE_WIDTH - LEFT_PAD.len() - ID_WIDTH - 2 - META_WIDTH - 2;
    let mut out = String::new();
    for robot in robots {
        let meta = if robot.manufacturer.is_empty() {
            robot.year.to_string()
        } else {
            format!("{} · {}", robot.manufacturer, robot.year)
        };
        let marker = if robot.featured { FEATURED_MARKER } else { " " };
        out.push_str(&format!(
            "{}{} {} {} {}\n",
            LEFT_PAD,
            paint(styles::muted(), fit(&robot.id, ID_WIDTH), use_color),
            paint(styles::title(), fit(&robot.name, title_width), use_color),
            paint(styles::muted(), fit(&meta, META_WIDTH), use_color),
            paint(styles::accent(), marker, use_color),
        ));
    }
    out
}

pub fn render_robot_detail(robot: &Robot) -> String {
    render_robot_detail_internal(robot, None)
}

fn render_robot_detail_internal(robot: &Robot, use_color: Option<bool>) -> String {
    let mut out = String::new();
    let heading = if robot.featured {
        format!("{} {}", robot.name, FEATURED_MARKER)
    } else {
        robot.name.clone()
    };
    out.push_str(&format!("{}\n", paint(styles::title(), heading, use_color)));
    out.push_str(&format!(
        "{}\n",
        paint(styles::muted(), format!("{} · {}", robot.slug, robot.id), use_color)
    ));

    let facts: Vec<String> = [
        robot.manufacturer.clone(),
        robot.year.to_string(),
        robot.category.clone(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect();
    out.push_str(&format!("{}\n", facts.join(" · ")));

    if !robot.description.is_empty() {
        out.push_str(&format!("\n{}\n", robot.description));
    }

    if !robot.specifications.is_empty() {
        out.push_str(&format!("\n{}\n", paint(styles::title(), "Specifications", use_color)));
        for (key, value) in &robot.specifications {
            out.push_str(&format!("{}{}: {}\n", LEFT_PAD, key, value));
        }
    }

    if !robot.features.is_empty() {
        out.push_str(&format!("\n{}\n", paint(styles::title(), "Features", use_color)));
        for feature in &robot.features {
            out.push_str(&format!("{}- {}\n", LEFT_PAD, feature));
        }
    }

    for paragraph in robot.paragraphs() {
        out.push_str(&format!("\n{}\n", paragraph));
    }

    if !robot.tags.is_empty() {
        out.push_str(&format!(
            "\n{}\n",
            paint(styles::faint(), format!("#{}", robot.tags.join(" #")), use_color)
        ));
    }
    out
}

pub fn render_news_list(articles: &[NewsArticle]) -> String {
    render_news_list_internal(articles, None)
}

fn render_news_list_internal(articles: &[NewsArticle], use_color: Option<bool>) -> String {
    if articles.is_empty() {
        return "No news yet, add an article with `robopedia news create`\n".to_string();
    }

    let title_width = LINE_WIDTH - LEFT_PAD.len() - ID_WIDTH - 2 - TIME_WIDTH - 2;
    let mut out = String::new();
    for article in articles {
        let title = if article.is_published() {
            paint(styles::title(), fit(&article.title, title_width), use_color)
        } else {
            let label = format!("[draft] {}", article.title);
            paint(styles::muted(), fit(&label, title_width), use_color)
        };
        out.push_str(&format!(
            "{}{} {} {}\n",
            LEFT_PAD,
            paint(styles::muted(), fit(&article.id, ID_WIDTH), use_color),
            title,
            paint(styles::muted(), format_time_ago(article.publish_date), use_color),
        ));
    }
    out
}

pub fn render_news_detail(article: &NewsArticle) -> String {
    render_news_detail_internal(article, None)
}

fn render_news_detail_internal(article: &NewsArticle, use_color: Option<bool>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", paint(styles::title(), &article.title, use_color)));

    let mut byline = vec![article.publish_date.format("%Y-%m-%d").to_string()];
    if !article.author.is_empty() {
        byline.push(article.author.clone());
    }
    if !article.category.is_empty() {
        byline.push(article.category.clone());
    }
    if !article.is_published() {
        byline.push("draft".to_string());
    }
    out.push_str(&format!("{}\n", paint(styles::muted(), byline.join(" · "), use_color)));

    if !article.summary.is_empty() {
        out.push_str(&format!("\n{}\n", article.summary));
    }
    for paragraph in article.paragraphs() {
        out.push_str(&format!("\n{}\n", paragraph));
    }

    if !article.related_robots.is_empty() {
        out.push_str(&format!(
            "\n{} {}\n",
            paint(styles::muted(), "Robots:", use_color),
            article.related_robots.join(", ")
        ));
    }
    for link in &article.external_links {
        out.push_str(&format!("{}{} <{}>\n", LEFT_PAD, link.title, link.url));
    }
    out
}

pub fn render_user_list(users: &[User]) -> String {
    render_user_list_internal(users, None)
}

fn render_user_list_internal(users: &[User], use_color: Option<bool>) -> String {
    if users.is_empty() {
        return "No users yet, add one with `robopedia users add`\n".to_string();
    }

    let mut out = String::new();
    for user in users {
        let role = serde_json::to_value(user.role)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let status = serde_json::to_value(user.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let last_login = user
            .last_login
            .map(format_time_ago)
            .unwrap_or_else(|| format!("{:>width$}", "never", width = TIME_WIDTH));

        out.push_str(&format!(
            "{}{} {} {} {} {}\n",
            LEFT_PAD,
            paint(styles::muted(), fit(&user.id, ID_WIDTH), use_color),
            paint(styles::title(), fit(&user.name, 20), use_color),
            fit(&user.email, 28),
            fit(&format!("{}/{}", role, status), 14),
            paint(styles::muted(), last_login, use_color),
        ));
    }
    out
}

pub fn render_activities(activities: &[Activity]) -> String {
    render_activities_internal(activities, None)
}

fn render_activities_internal(activities: &[Activity], use_color: Option<bool>) -> String {
    if activities.is_empty() {
        return "No activity recorded\n".to_string();
    }
    activities
        .iter()
        .map(|activity| {
            format!(
                "{}{} {}\n",
                LEFT_PAD,
                paint(styles::muted(), format_time_ago(activity.timestamp), use_color),
                activity.action
            )
        })
        .collect()
}

pub fn render_settings(settings: &Settings) -> String {
    if settings.is_empty() {
        return "No settings\n".to_string();
    }
    settings
        .iter()
        .map(|(key, value)| format!("{} = {}\n", key, value))
        .collect()
}

pub fn render_messages(messages: &[CmdMessage]) -> String {
    render_messages_internal(messages, None)
}

fn render_messages_internal(messages: &[CmdMessage], use_color: Option<bool>) -> String {
    messages
        .iter()
        .map(|msg| {
            let style = match msg.level {
                MessageLevel::Info => styles::info(),
                MessageLevel::Success => styles::success(),
                MessageLevel::Warning => styles::warning(),
                MessageLevel::Error => styles::error(),
            };
            format!("{}\n", paint(style, &msg.content, use_color))
        })
        .collect()
}

/// Prints command messages to stdout.
pub fn print_messages(messages: &[CmdMessage]) {
    print!("{}", render_messages(messages));
}

fn paint(style: Style, text: impl Display, use_color: Option<bool>) -> String {
    let style = match use_color {
        Some(force) => style.force_styling(force),
        None => style,
    };
    style.apply_to(text).to_string()
}

/// Truncates to `width` display columns (ending in `…`) and pads with spaces.
fn fit(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = text.width();
    if used <= width {
        out.push_str(text);
    } else {
        used = 0;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w + 1 > width {
                break;
            }
            out.push(ch);
            used += w;
        }
        out.push('…');
        used += 1;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(timestamp);
    let text = match elapsed.to_std() {
        Ok(duration) => timeago::Formatter::new().convert(duration),
        // Scheduled articles
        Err(_) => timestamp.format("%Y-%m-%d").to_string(),
    };
    format!("{:>width$}", text, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use robopedia::model::{NewsDraft, NewsStatus, RobotDraft, UserDraft};
    use robopedia::record::Record;

    fn robot(name: &str) -> Robot {
        Robot::from_draft(
            "robot-001".to_string(),
            robopedia::slug::slugify(name),
            RobotDraft {
                manufacturer: Some("Boston Dynamics".to_string()),
                year: Some(2013),
                ..RobotDraft::named(name)
            },
        )
    }

    #[test]
    fn empty_lists_explain_how_to_add() {
        assert!(render_robot_list_internal(&[], Some(false)).contains("robopedia robots create"));
        assert!(render_news_list_internal(&[], Some(false)).contains("robopedia news create"));
        assert!(render_user_list_internal(&[], Some(false)).contains("robopedia users add"));
    }

    #[test]
    fn robot_rows_share_one_width() {
        let mut featured = robot("Atlas");
        featured.featured = true;
        let wide = robot("ペッパー");
        let output = render_robot_list_internal(&[featured, wide], Some(false));

        let widths: Vec<usize> = output.lines().map(|l| l.width()).collect();
        assert_eq!(widths, vec![LINE_WIDTH, LINE_WIDTH]);
        assert!(output.contains(FEATURED_MARKER));
        assert!(output.contains("Boston Dynamics · 2013"));
    }

    #[test]
    fn long_names_are_truncated() {
        let name = "A".repeat(200);
        let output = render_robot_list_internal(&[robot(&name)], Some(false));
        assert!(output.contains('…'));
        assert_eq!(output.lines().next().unwrap().width(), LINE_WIDTH);
    }

    #[test]
    fn fit_pads_and_truncates_by_display_width() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("ロボット", 5), "ロボ…");
        assert_eq!(fit("ロボット", 5).width(), 5);
        assert_eq!(fit("x", 0), "");
    }

    #[test]
    fn robot_detail_lists_specs_and_paragraphs() {
        let mut atlas = robot("Atlas");
        atlas.specifications.insert("height".to_string(), "1.5 m".to_string());
        atlas.content = "First part.\n\nSecond part.".to_string();
        let output = render_robot_detail_internal(&atlas, Some(false));

        assert!(output.starts_with("Atlas\n"));
        assert!(output.contains("atlas · robot-001"));
        assert!(output.contains("  height: 1.5 m"));
        assert!(output.contains("\nFirst part.\n"));
        assert!(output.contains("\nSecond part.\n"));
    }

    #[test]
    fn drafts_are_labelled() {
        let article = NewsArticle::from_draft(
            "news-1".to_string(),
            "soon".to_string(),
            NewsDraft {
                status: Some(NewsStatus::Draft),
                publish_date: Some(Utc::now() - Duration::days(2)),
                ..NewsDraft::titled("Soon")
            },
        );
        let output = render_news_list_internal(&[article.clone()], Some(false));
        assert!(output.contains("[draft] Soon"));
        assert!(output.contains("2 days ago"));
        assert!(render_news_detail_internal(&article, Some(false)).contains("draft"));
    }

    #[test]
    fn users_without_login_show_never() {
        let user = User::from_draft(
            "user-1".to_string(),
            "ada@example.com".to_string(),
            UserDraft {
                email: Some("ada@example.com".to_string()),
                name: Some("Ada".to_string()),
                password: Some("secret".to_string()),
                ..Default::default()
            },
        );
        let output = render_user_list_internal(&[user], Some(false));
        assert!(output.contains("ada@example.com"));
        assert!(output.contains("user/active"));
        assert!(output.contains("never"));
        assert!(!output.contains("secret"));
    }

    #[test]
    fn activities_show_age_and_action() {
        let mut activity = Activity::new("Created robot 'Atlas'");
        activity.timestamp = Utc::now() - Duration::minutes(5);
        let output = render_activities_internal(&[activity], Some(false));
        assert!(output.contains("5 minutes ago Created robot 'Atlas'"));
    }

    #[test]
    fn messages_render_plain_without_color() {
        let output = render_messages_internal(
            &[CmdMessage::success("Saved"), CmdMessage::warning("Careful")],
            Some(false),
        );
        assert_eq!(output, "Saved\nCareful\n");
    }

    #[test]
    fn settings_print_as_json_values() {
        let mut settings = Settings::new();
        settings.insert("siteName".to_string(), serde_json::json!("Robopedia"));
        settings.insert("perPage".to_string(), serde_json::json!(12));
        assert_eq!(render_settings(&settings), "perPage = 12\nsiteName = \"Robopedia\"\n");
    }
}
