use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::videos::VideoStatsRow;

pub const CREATOR_FUND_MIN_FOLLOWERS: i64 = 1_000;
pub const CREATOR_FUND_MIN_VIEWS: i64 = 10_000;
pub const MIN_WITHDRAWAL_CENTS: i64 = 1_000;

// Creators keep half of every gift; each view is worth one cent.
const GIFT_SHARE_CENTS_PER_UNIT: i64 = 50;
const VIEW_CENTS: i64 = 1;

fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatorEarnings {
    pub total_earnings: f64,
    pub gift_earnings: f64,
    pub view_earnings: f64,
    pub monthly_earnings: f64,
    pub withdrawable: f64,
    pub total_views: i64,
    pub followers: i64,
    pub is_eligible: bool,
    pub eligibility_progress: f64,
    #[serde(skip)]
    pub withdrawable_cents: i64,
}

impl CreatorEarnings {
    pub fn can_withdraw(&self) -> bool {
        self.withdrawable_cents >= MIN_WITHDRAWAL_CENTS
    }
}

/// `gift_total` is the sum of `total_price` over every gift the creator received.
pub fn creator_earnings(gift_total: i64, total_views: i64, followers: i64) -> CreatorEarnings {
    let gift_cents = gift_total.max(0) * GIFT_SHARE_CENTS_PER_UNIT;
    let view_cents = total_views.max(0) * VIEW_CENTS;
    let total_cents = gift_cents + view_cents;

    CreatorEarnings {
        total_earnings: cents_to_dollars(total_cents),
        gift_earnings: cents_to_dollars(gift_cents),
        view_earnings: cents_to_dollars(view_cents),
        monthly_earnings: cents_to_dollars(total_cents),
        withdrawable: cents_to_dollars(gift_cents),
        total_views,
        followers,
        is_eligible: followers >= CREATOR_FUND_MIN_FOLLOWERS
            && total_views >= CREATOR_FUND_MIN_VIEWS,
        eligibility_progress: eligibility_progress(followers, total_views),
        withdrawable_cents: gift_cents,
    }
}

pub fn eligibility_progress(followers: i64, total_views: i64) -> f64 {
    let follower_part = followers.max(0) as f64 / CREATOR_FUND_MIN_FOLLOWERS as f64 * 50.0;
    let view_part = total_views.max(0) as f64 / CREATOR_FUND_MIN_VIEWS as f64 * 50.0;
    (follower_part + view_part).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyticsRange {
    SevenDays,
    #[default]
    ThirtyDays,
    All,
}

impl AnalyticsRange {
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::SevenDays => Some(now - Duration::days(7)),
            Self::ThirtyDays => Some(now - Duration::days(30)),
            Self::All => None,
        }
    }
}

impl std::str::FromStr for AnalyticsRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Self::SevenDays),
            "30d" => Ok(Self::ThirtyDays),
            "all" => Ok(Self::All),
            other => Err(format!("Invalid range '{other}'. Use: 7d, 30d, or all")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopVideo {
    pub id: Uuid,
    pub caption: Option<String>,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatorAnalytics {
    pub total_views: i64,
    pub total_videos: i64,
    pub average_views: i64,
    pub followers: i64,
    pub top_video: Option<TopVideo>,
}

/// `videos` is expected to be already restricted to the analytics window.
pub fn creator_analytics(videos: &[VideoStatsRow], followers: i64) -> CreatorAnalytics {
    let total_views: i64 = videos.iter().map(|v| v.views as i64).sum();
    let total_videos = videos.len() as i64;
    let average_views = if total_videos == 0 {
        0
    } else {
        (total_views as f64 / total_videos as f64).round() as i64
    };

    let mut top: Option<&VideoStatsRow> = None;
    for video in videos {
        if top.is_none_or(|best| video.views > best.views) {
            top = Some(video);
        }
    }

    CreatorAnalytics {
        total_views,
        total_videos,
        average_views,
        followers,
        top_video: top.map(|v| TopVideo {
            id: v.id,
            caption: v.caption.clone(),
            views: v.views as i64,
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminDashboard {
    pub total_users: i64,
    pub total_videos: i64,
    pub active_live_streams: i64,
    pub gift_volume: i64,
    pub open_reports: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(views: i32, caption: &str) -> VideoStatsRow {
        VideoStatsRow {
            id: Uuid::new_v4(),
            caption: Some(caption.to_string()),
            views,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn earnings_split_between_gifts_and_views() {
        let earnings = creator_earnings(200, 5_000, 10);

        assert_eq!(earnings.gift_earnings, 100.0);
        assert_eq!(earnings.view_earnings, 50.0);
        assert_eq!(earnings.total_earnings, 150.0);
        assert_eq!(earnings.monthly_earnings, earnings.total_earnings);
        assert_eq!(earnings.withdrawable, 100.0);
        assert!(earnings.can_withdraw());
    }

    #[test]
    fn withdrawal_needs_ten_dollars_of_gift_earnings() {
        assert!(!creator_earnings(19, 1_000_000, 0).can_withdraw());
        assert!(creator_earnings(20, 0, 0).can_withdraw());
    }

    #[test]
    fn eligibility_requires_both_thresholds() {
        assert!(!creator_earnings(0, 10_000, 999).is_eligible);
        assert!(!creator_earnings(0, 9_999, 1_000).is_eligible);
        assert!(creator_earnings(0, 10_000, 1_000).is_eligible);
    }

    #[test]
    fn progress_is_capped_at_one_hundred() {
        assert_eq!(eligibility_progress(500, 5_000), 50.0);
        assert_eq!(eligibility_progress(1_000, 0), 50.0);
        assert_eq!(eligibility_progress(50_000, 90_000), 100.0);
    }

    #[test]
    fn analytics_rounds_average_and_keeps_first_top_video() {
        let videos = vec![stats(10, "first"), stats(25, "tie-a"), stats(25, "tie-b")];

        let analytics = creator_analytics(&videos, 7);

        assert_eq!(analytics.total_views, 60);
        assert_eq!(analytics.total_videos, 3);
        assert_eq!(analytics.average_views, 20);
        assert_eq!(analytics.followers, 7);
        assert_eq!(
            analytics.top_video.and_then(|v| v.caption).as_deref(),
            Some("tie-a")
        );
    }

    #[test]
    fn analytics_on_no_videos_is_zeroed() {
        let analytics = creator_analytics(&[], 0);
        assert_eq!(analytics.average_views, 0);
        assert!(analytics.top_video.is_none());
    }

    #[test]
    fn range_parsing_and_window() {
        let now = Utc::now();
        assert_eq!("7d".parse::<AnalyticsRange>(), Ok(AnalyticsRange::SevenDays));
        assert_eq!(AnalyticsRange::default(), AnalyticsRange::ThirtyDays);
        assert_eq!(AnalyticsRange::All.since(now), None);
        assert_eq!(
            AnalyticsRange::SevenDays.since(now),
            Some(now - Duration::days(7))
        );
        assert!("1y".parse::<AnalyticsRange>().is_err());
    }
}
