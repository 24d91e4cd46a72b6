use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pagination::{Pagination, PaginationUpdate};

/// Filter value that matches every category.
pub const ALL_CATEGORIES: &str = "all";

/// Tag shown for a category missing from [`CATEGORY_LABELS`].
pub const DEFAULT_CATEGORY_LABEL: &str = "Эн+ Тепло Волга";

/// Display tag for each known news category.
pub const CATEGORY_LABELS: &[(&str, &str)] = &[
    ("enplusGroup", "ЭН+ Групп"),
    ("heatingNetworks", "Теплосети"),
    ("generation", "Генерация тепло"),
    ("avtozavodskayaTpp", "Автозаводская ТЭЦ"),
    ("factoryNetworks", "Заводские сети"),
    ("youthCouncil", "Молодежный совет"),
    ("worksCouncil", "Рабочий совет"),
    ("ecology", "Экология"),
];

/// Genitive month names, January first.
const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Tag text for `category`.
pub fn category_label(category: &str) -> &'static str {
    CATEGORY_LABELS
        .iter()
        .find(|(key, _)| *key == category)
        .map_or(DEFAULT_CATEGORY_LABEL, |&(_, label)| label)
}

/// Card date for an ISO date (`2024-05-01` or `2024-05-01T10:00:00`):
/// day of month and genitive month name, e.g. `1 мая`.
///
/// An empty date stays empty. Anything that is not an ISO date is returned
/// unchanged.
pub fn format_date(date: &str) -> String {
    let date = date.trim();
    if date.is_empty() {
        return String::new();
    }
    parse_month_day(date)
        .map(|(month, day)| format!("{day} {}", MONTHS_GENITIVE[month - 1]))
        .unwrap_or_else(|| date.to_string())
}

fn parse_month_day(date: &str) -> Option<(usize, u32)> {
    let day_part = date.split(['T', ' ']).next()?;
    let mut fields = day_part.split('-');
    let year = fields.next()?;
    let month: usize = fields.next()?.parse().ok()?;
    let day: u32 = fields.next()?.parse().ok()?;
    if fields.next().is_some()
        || year.len() != 4
        || !year.bytes().all(|b| b.is_ascii_digit())
        || !(1..=12).contains(&month)
        || !(1..=31).contains(&day)
    {
        return None;
    }
    Some((month, day))
}

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("malformed news data: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One entry of the news list, as stored in the page's JSON data block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl NewsItem {
    /// Alt text for the item image, falling back to the title.
    pub fn image_alt(&self) -> &str {
        self.image_alt.as_deref().unwrap_or(&self.title)
    }

    pub fn category_label(&self) -> &'static str {
        category_label(&self.category)
    }

    pub fn display_date(&self) -> String {
        format_date(&self.date)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NewsFilter {
    #[default]
    All,
    Category(String),
}

impl NewsFilter {
    /// `"all"` (or an empty value) selects everything; anything else is a
    /// category name.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Category(value.to_string())
        }
    }

    pub fn matches(&self, item: &NewsItem) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => item.category == *category,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Category(category) => category,
        }
    }
}

/// A filterable, paginated news list.
#[derive(Clone, Debug)]
pub struct NewsFeed {
    items: Vec<NewsItem>,
    filter: NewsFilter,
    // Indices into `items` that pass `filter`, in source order.
    filtered: Vec<usize>,
    pagination: Pagination,
}

impl NewsFeed {
    pub fn new(items: Vec<NewsItem>, items_per_page: usize) -> Self {
        let mut feed = Self {
            items,
            filter: NewsFilter::All,
            filtered: Vec::new(),
            pagination: Pagination::new(0, items_per_page),
        };
        feed.refilter();
        feed
    }

    /// Build a feed from a JSON array of items.
    pub fn from_json(json: &str, items_per_page: usize) -> Result<Self, NewsError> {
        let items: Vec<NewsItem> = serde_json::from_str(json)?;
        debug_log!("loaded {} news items", items.len());
        Ok(Self::new(items, items_per_page))
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn filter(&self) -> &NewsFilter {
        &self.filter
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Number of items passing the current filter.
    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// Distinct categories in order of first appearance.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for item in &self.items {
            if !categories.contains(&item.category.as_str()) {
                categories.push(&item.category);
            }
        }
        categories
    }

    /// Switch filters and go back to page 1. Returns `false` without touching
    /// anything when `filter` is already active.
    pub fn set_filter(&mut self, filter: NewsFilter) -> bool {
        if self.filter == filter {
            return false;
        }
        debug_log!("news filter: {} -> {}", self.filter.as_str(), filter.as_str());
        self.filter = filter;
        self.refilter();
        true
    }

    /// Replace the items, keeping the active filter, and go back to page 1.
    pub fn update_news(&mut self, items: Vec<NewsItem>) {
        self.items = items;
        self.refilter();
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.pagination.go_to_page(page)
    }

    /// Items on the current page.
    pub fn visible_items(&self) -> Vec<&NewsItem> {
        self.filtered[self.pagination.item_range()]
            .iter()
            .map(|&index| &self.items[index])
            .collect()
    }

    fn refilter(&mut self) {
        self.filtered = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.filter.matches(item))
            .map(|(index, _)| index)
            .collect();
        self.pagination.update(PaginationUpdate {
            total_items: Some(self.filtered.len()),
            current_page: Some(1),
            ..Default::default()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, category: &str) -> NewsItem {
        NewsItem {
            id,
            title: format!("Item {id}"),
            description: String::new(),
            category: category.to_string(),
            date: "2024-01-01".to_string(),
            image: format!("img/{id}.jpg"),
            image_alt: None,
            link: None,
        }
    }

    fn feed() -> NewsFeed {
        let items = (1..=12)
            .map(|id| item(id, if id % 3 == 0 { "events" } else { "press" }))
            .collect();
        NewsFeed::new(items, 3)
    }

    fn ids(items: &[&NewsItem]) -> Vec<u64> {
        items.iter().map(|item| item.id).collect()
    }

    #[test]
    fn parses_json_items() {
        let json = r#"[
            {"id": 1, "title": "Opening", "description": "d", "category": "events",
             "date": "2024-05-01", "image": "a.jpg", "imageAlt": "hall", "link": "pages/a.html"},
            {"id": 2, "title": "Report", "category": "press"}
        ]"#;
        let feed = NewsFeed::from_json(json, 9).unwrap();
        assert_eq!(feed.items().len(), 2);
        assert_eq!(feed.items()[0].image_alt(), "hall");
        assert_eq!(feed.items()[0].link.as_deref(), Some("pages/a.html"));
        assert_eq!(feed.items()[1].image_alt(), "Report");
        assert_eq!(feed.items()[1].date, "");
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = NewsFeed::from_json("{not json", 9).unwrap_err();
        assert!(err.to_string().starts_with("malformed news data"));
    }

    #[test]
    fn filter_parse() {
        assert_eq!(NewsFilter::parse("all"), NewsFilter::All);
        assert_eq!(NewsFilter::parse(""), NewsFilter::All);
        assert_eq!(
            NewsFilter::parse("events"),
            NewsFilter::Category("events".into())
        );
        assert_eq!(NewsFilter::parse("events").as_str(), "events");
    }

    #[test]
    fn first_page_of_all_items() {
        let feed = feed();
        assert_eq!(feed.pagination().total_pages(), 4);
        assert_eq!(ids(&feed.visible_items()), vec![1, 2, 3]);
    }

    #[test]
    fn paging_moves_the_window() {
        let mut feed = feed();
        assert!(feed.go_to_page(4));
        assert_eq!(ids(&feed.visible_items()), vec![10, 11, 12]);
        assert!(!feed.go_to_page(5));
    }

    #[test]
    fn filter_resets_to_first_page() {
        let mut feed = feed();
        feed.go_to_page(3);
        assert!(feed.set_filter(NewsFilter::parse("events")));
        assert_eq!(feed.pagination().current_page(), 1);
        assert_eq!(feed.filtered_len(), 4);
        assert_eq!(ids(&feed.visible_items()), vec![3, 6, 9]);
        feed.go_to_page(2);
        assert_eq!(ids(&feed.visible_items()), vec![12]);
    }

    #[test]
    fn same_filter_is_a_no_op() {
        let mut feed = feed();
        feed.go_to_page(2);
        assert!(!feed.set_filter(NewsFilter::All));
        assert_eq!(feed.pagination().current_page(), 2);
    }

    #[test]
    fn unknown_category_is_empty() {
        let mut feed = feed();
        feed.set_filter(NewsFilter::parse("sports"));
        assert!(feed.visible_items().is_empty());
        assert!(!feed.pagination().is_rendered());
    }

    #[test]
    fn update_keeps_filter() {
        let mut feed = feed();
        feed.set_filter(NewsFilter::parse("press"));
        feed.go_to_page(2);
        feed.update_news(vec![item(20, "press"), item(21, "events")]);
        assert_eq!(feed.pagination().current_page(), 1);
        assert_eq!(ids(&feed.visible_items()), vec![20]);
    }

    #[test]
    fn known_categories_have_labels() {
        assert_eq!(category_label("enplusGroup"), "ЭН+ Групп");
        assert_eq!(category_label("ecology"), "Экология");
        assert_eq!(item(1, "avtozavodskayaTpp").category_label(), "Автозаводская ТЭЦ");
    }

    #[test]
    fn unknown_category_uses_default_label() {
        assert_eq!(category_label("press"), DEFAULT_CATEGORY_LABEL);
        assert_eq!(category_label(""), DEFAULT_CATEGORY_LABEL);
        assert_eq!(category_label("Ecology"), DEFAULT_CATEGORY_LABEL);
    }

    #[test]
    fn dates_show_day_and_month() {
        assert_eq!(format_date("2024-05-01"), "1 мая");
        assert_eq!(format_date("2023-12-31T18:30:00"), "31 декабря");
        assert_eq!(item(1, "press").display_date(), "1 января");
    }

    #[test]
    fn odd_dates_pass_through() {
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("вчера"), "вчера");
        assert_eq!(format_date("2024-13-01"), "2024-13-01");
        assert_eq!(format_date("2024-02-00"), "2024-02-00");
    }

    #[test]
    fn categories_in_first_seen_order() {
        assert_eq!(feed().categories(), vec!["press", "events"]);
    }
}
