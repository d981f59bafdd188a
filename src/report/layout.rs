use crate::models::GradedResult;
use crate::scoring::{format_marks, format_similarity, ScoreTotal};

use super::ReportMeta;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const MARGIN_LEFT: f32 = 14.0;
const TITLE_Y: f32 = 22.0;
const SUBJECT_Y: f32 = 32.0;
const EMAIL_Y: f32 = 38.0;
const TABLE_TOP_FIRST: f32 = 45.0;
const TABLE_TOP_CONTINUED: f32 = 20.0;
const TABLE_BOTTOM: f32 = PAGE_HEIGHT_MM - 20.0;
const FOOTER_Y: f32 = PAGE_HEIGHT_MM - 10.0;
const TOTAL_GAP: f32 = 15.0;

const TITLE_SIZE: f32 = 18.0;
const META_SIZE: f32 = 12.0;
const CELL_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 10.0;
const TOTAL_SIZE: f32 = 12.0;

const CELL_PADDING: f32 = 2.0;
const LINE_HEIGHT: f32 = 4.2;
const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;

pub const COLUMN_WIDTHS: [f32; 6] = [15.0, 40.0, 40.0, 40.0, 25.0, 20.0];
pub const COLUMN_HEADERS: [&str; 6] = [
    "Sr. No",
    "Question",
    "User Answer",
    "Model Answer",
    "Similarity",
    "Marks",
];

pub const TITLE: &str = "Test Results Report";
pub const NO_ANSWER: &str = "No answer provided";
const UNKNOWN_SUBJECT: &str = "Unknown Subject";
const DEFAULT_USER: &str = "User";
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    /// Baseline, measured down from the top edge.
    pub y: f32,
    pub size: f32,
    pub weight: FontWeight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub number: usize,
    pub items: Vec<TextItem>,
    /// Indices into the input of the rows placed on this page.
    pub rows: Vec<usize>,
}

impl PageLayout {
    fn new(number: usize) -> Self {
        Self {
            number,
            items: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, weight: FontWeight) {
        self.items.push(TextItem {
            text: text.into(),
            x,
            y,
            size,
            weight,
        });
    }

    #[cfg(test)]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.items.iter().any(|item| item.text == needle)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub pages: Vec<PageLayout>,
    pub total: ScoreTotal,
}

pub fn total_line(total: ScoreTotal) -> String {
    format!("Total Score: {}", total)
}

/// Cell strings for one result, in column order.
pub fn row_cells(index: usize, result: &GradedResult) -> [String; 6] {
    let user_answer = if result.user_answer.is_empty() {
        NO_ANSWER.to_string()
    } else {
        result.user_answer.clone()
    };
    [
        (index + 1).to_string(),
        result.question.clone(),
        user_answer,
        result.answer.clone(),
        format_similarity(result.similarity),
        format_marks(result.marks),
    ]
}

fn chars_per_line(column_width: f32) -> usize {
    let usable = column_width - 2.0 * CELL_PADDING;
    let glyph = CELL_SIZE * PT_TO_MM * AVG_GLYPH_EM;
    ((usable / glyph).floor() as usize).max(1)
}

/// Greedy word wrap; words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;

        for word in paragraph.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();

            while chars.len() > max_chars {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = chars.split_off(max_chars);
                lines.push(chars.into_iter().collect());
                chars = rest;
            }

            let word_len = chars.len();
            if line_len > 0 && line_len + 1 + word_len > max_chars {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(chars);
            line_len += word_len;
        }

        if line_len > 0 || lines.is_empty() {
            lines.push(line);
        }
    }

    lines
}

fn truncate_lines(mut lines: Vec<String>, max_lines: usize, max_chars: usize) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines.max(1));
    if let Some(last) = lines.last_mut() {
        let keep = max_chars.saturating_sub(ELLIPSIS.len());
        let mut shortened: String = last.chars().take(keep).collect();
        shortened.push_str(ELLIPSIS);
        *last = shortened;
    }
    lines
}

fn row_height(line_count: usize) -> f32 {
    line_count as f32 * LINE_HEIGHT + 2.0 * CELL_PADDING
}

fn column_x(column: usize) -> f32 {
    MARGIN_LEFT + COLUMN_WIDTHS[..column].iter().sum::<f32>()
}

fn place_row(page: &mut PageLayout, top: f32, cells: &[Vec<String>], weight: FontWeight) {
    for (column, lines) in cells.iter().enumerate() {
        let x = column_x(column) + CELL_PADDING;
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let baseline = top + CELL_PADDING + LINE_HEIGHT * (i as f32 + 0.8);
            page.text(line.clone(), x, baseline, CELL_SIZE, weight);
        }
    }
}

fn wrap_cells(cells: &[String]) -> Vec<Vec<String>> {
    cells
        .iter()
        .zip(COLUMN_WIDTHS.iter())
        .map(|(text, width)| wrap_text(text, chars_per_line(*width)))
        .collect()
}

fn lines_in(cells: &[Vec<String>]) -> usize {
    cells.iter().map(Vec::len).max().unwrap_or(1)
}

struct Paginator {
    pages: Vec<PageLayout>,
    current: PageLayout,
    cursor: f32,
    header: Vec<Vec<String>>,
    header_height: f32,
}

impl Paginator {
    fn new(meta: &ReportMeta) -> Self {
        let header: Vec<Vec<String>> = wrap_cells(&COLUMN_HEADERS.map(String::from));
        let header_height = row_height(lines_in(&header));

        let mut first = PageLayout::new(1);
        first.text(TITLE, MARGIN_LEFT, TITLE_Y, TITLE_SIZE, FontWeight::Regular);
        first.text(
            format!(
                "Subject: {}",
                meta.subject.as_deref().filter(|s| !s.is_empty()).unwrap_or(UNKNOWN_SUBJECT)
            ),
            MARGIN_LEFT,
            SUBJECT_Y,
            META_SIZE,
            FontWeight::Regular,
        );
        first.text(
            format!(
                "Email: {}",
                meta.user_label.as_deref().filter(|s| !s.is_empty()).unwrap_or(DEFAULT_USER)
            ),
            MARGIN_LEFT,
            EMAIL_Y,
            META_SIZE,
            FontWeight::Regular,
        );

        let mut paginator = Self {
            pages: Vec::new(),
            current: first,
            cursor: TABLE_TOP_FIRST,
            header,
            header_height,
        };
        paginator.place_header();
        paginator
    }

    fn place_header(&mut self) {
        place_row(&mut self.current, self.cursor, &self.header, FontWeight::Bold);
        self.cursor += self.header_height;
    }

    /// Tallest row that still fits on a continuation page.
    fn max_row_lines(&self) -> usize {
        let space = TABLE_BOTTOM - TABLE_TOP_CONTINUED - self.header_height - 2.0 * CELL_PADDING;
        ((space / LINE_HEIGHT).floor() as usize).max(1)
    }

    fn finish_page(&mut self) {
        let number = self.current.number;
        self.current.text(
            format!("Page {}", number),
            MARGIN_LEFT,
            FOOTER_Y,
            FOOTER_SIZE,
            FontWeight::Regular,
        );
        let next = PageLayout::new(number + 1);
        self.pages.push(std::mem::replace(&mut self.current, next));
        self.cursor = TABLE_TOP_CONTINUED;
    }

    fn place_result(&mut self, index: usize, result: &GradedResult) {
        let max_lines = self.max_row_lines();
        let cells: Vec<Vec<String>> = row_cells(index, result)
            .iter()
            .zip(COLUMN_WIDTHS.iter())
            .map(|(text, width)| {
                let per_line = chars_per_line(*width);
                truncate_lines(wrap_text(text, per_line), max_lines, per_line)
            })
            .collect();
        let height = row_height(lines_in(&cells));

        if self.cursor + height > TABLE_BOTTOM {
            self.finish_page();
            self.place_header();
        }

        place_row(&mut self.current, self.cursor, &cells, FontWeight::Regular);
        self.current.rows.push(index);
        self.cursor += height;
    }

    fn place_total(&mut self, line: String) {
        let mut y = self.cursor + TOTAL_GAP;
        if y > TABLE_BOTTOM {
            self.finish_page();
            y = TABLE_TOP_CONTINUED + TOTAL_GAP;
        }
        self.current
            .text(line, MARGIN_LEFT, y, TOTAL_SIZE, FontWeight::Bold);
    }

    fn finish(mut self) -> Vec<PageLayout> {
        let number = self.current.number;
        self.current.text(
            format!("Page {}", number),
            MARGIN_LEFT,
            FOOTER_Y,
            FOOTER_SIZE,
            FontWeight::Regular,
        );
        self.pages.push(self.current);
        self.pages
    }
}

/// Lays out the whole report. Does not modify or re-score its input.
pub fn build(results: &[GradedResult], meta: &ReportMeta) -> ReportLayout {
    let total = ScoreTotal::of(results);
    let mut paginator = Paginator::new(meta);

    for (index, result) in results.iter().enumerate() {
        paginator.place_result(index, result);
    }
    paginator.place_total(total_line(total));

    ReportLayout {
        pages: paginator.finish(),
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(marks: u32, user_answer: &str) -> GradedResult {
        GradedResult {
            id: 1,
            question: "What does a scheduler do?".into(),
            answer: "It decides which process runs next.".into(),
            user_answer: user_answer.into(),
            similarity: 72.5,
            marks,
        }
    }

    fn meta() -> ReportMeta {
        ReportMeta {
            subject: Some("os".into()),
            user_label: Some("me@example.com".into()),
        }
    }

    fn all_items(layout: &ReportLayout) -> Vec<&TextItem> {
        layout.pages.iter().flat_map(|p| p.items.iter()).collect()
    }

    mod wrap_tests {
        use super::*;

        #[test]
        fn wraps_on_word_boundaries() {
            assert_eq!(
                wrap_text("the quick brown fox", 10),
                vec!["the quick", "brown fox"]
            );
        }

        #[test]
        fn splits_long_words() {
            assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        }

        #[test]
        fn keeps_explicit_newlines() {
            assert_eq!(wrap_text("one\ntwo", 20), vec!["one", "two"]);
        }

        #[test]
        fn empty_text_is_one_empty_line() {
            assert_eq!(wrap_text("", 10), vec![""]);
        }

        #[test]
        fn truncation_adds_ellipsis() {
            let lines = vec!["aaaa".to_string(), "bbbb".to_string(), "cccc".to_string()];
            assert_eq!(truncate_lines(lines, 2, 4), vec!["aaaa", "b..."]);
        }
    }

    mod cell_tests {
        use super::*;

        #[test]
        fn row_cells_format_columns() {
            let cells = row_cells(0, &result(7, "It picks a process."));
            assert_eq!(cells[0], "1");
            assert_eq!(cells[2], "It picks a process.");
            assert_eq!(cells[4], "72.50%");
            assert_eq!(cells[5], "7/10");
        }

        #[test]
        fn empty_user_answer_gets_placeholder() {
            let cells = row_cells(4, &result(0, ""));
            assert_eq!(cells[0], "5");
            assert_eq!(cells[2], NO_ANSWER);
        }

        #[test]
        fn column_widths_are_fixed() {
            assert_eq!(COLUMN_WIDTHS.iter().sum::<f32>(), 180.0);
            assert!(MARGIN_LEFT + 180.0 <= PAGE_WIDTH_MM);
        }
    }

    mod layout_tests {
        use super::*;

        #[test]
        fn first_page_has_title_and_metadata() {
            let layout = build(&[result(5, "x")], &meta());
            let first = &layout.pages[0];
            assert!(first.contains_text(TITLE));
            assert!(first.contains_text("Subject: os"));
            assert!(first.contains_text("Email: me@example.com"));
        }

        #[test]
        fn missing_metadata_uses_fallbacks() {
            let layout = build(&[], &ReportMeta::default());
            assert!(layout.pages[0].contains_text("Subject: Unknown Subject"));
            assert!(layout.pages[0].contains_text("Email: User"));
        }

        #[test]
        fn total_sums_marks() {
            let results = [result(7, "a"), result(3, "b"), result(10, "c")];
            let layout = build(&results, &meta());
            assert_eq!(total_line(layout.total), "Total Score: 20 / 30");

            let total = all_items(&layout)
                .into_iter()
                .find(|i| i.text == "Total Score: 20 / 30")
                .unwrap();
            assert_eq!(total.weight, FontWeight::Bold);
        }

        #[test]
        fn empty_input_renders_zero_over_zero() {
            let layout = build(&[], &meta());
            assert_eq!(layout.pages.len(), 1);
            assert!(layout.pages[0].rows.is_empty());
            assert!(layout.pages[0].contains_text("Total Score: 0 / 0"));
            assert!(layout.pages[0].contains_text("Sr. No") || layout.pages[0].contains_text("Sr."));
        }

        #[test]
        fn input_is_not_modified() {
            let results = vec![result(4, ""), result(9, "y")];
            let before = results.clone();
            let _ = build(&results, &meta());
            assert_eq!(results, before);
        }

        #[test]
        fn total_is_below_last_row_on_last_page() {
            let layout = build(&[result(5, "x")], &meta());
            let page = layout.pages.last().unwrap();
            let total_y = page
                .items
                .iter()
                .find(|i| i.text.starts_with("Total Score"))
                .unwrap()
                .y;
            let lowest_cell = page
                .items
                .iter()
                .filter(|i| i.size == CELL_SIZE && !i.text.starts_with("Page "))
                .map(|i| i.y)
                .fold(0.0_f32, f32::max);
            assert!(total_y > lowest_cell);
        }

        #[test]
        fn deterministic() {
            let results = [result(7, "a"), result(3, "")];
            assert_eq!(build(&results, &meta()), build(&results, &meta()));
        }
    }

    mod pagination_tests {
        use super::*;

        fn many(n: usize) -> Vec<GradedResult> {
            (0..n).map(|i| result((i % 11) as u32, "some answer text")).collect()
        }

        #[test]
        fn long_reports_span_pages() {
            let results = many(60);
            let layout = build(&results, &meta());
            assert!(layout.pages.len() > 1);

            let placed: Vec<usize> = layout.pages.iter().flat_map(|p| p.rows.clone()).collect();
            assert_eq!(placed, (0..60).collect::<Vec<usize>>());
        }

        #[test]
        fn every_page_has_number_footer() {
            let layout = build(&many(60), &meta());
            for page in &layout.pages {
                assert!(page.contains_text(&format!("Page {}", page.number)));
            }
        }

        #[test]
        fn header_row_repeats_on_each_page() {
            let layout = build(&many(60), &meta());
            for page in &layout.pages {
                assert!(page.contains_text("Question"));
                assert!(page.contains_text("Marks"));
            }
        }

        #[test]
        fn nothing_drawn_below_table_area_except_footer() {
            let layout = build(&many(60), &meta());
            for page in &layout.pages {
                for item in &page.items {
                    if !item.text.starts_with("Page ") {
                        assert!(item.y <= TABLE_BOTTOM, "{} at {}", item.text, item.y);
                    }
                }
            }
        }

        #[test]
        fn oversized_row_is_truncated_to_fit() {
            let mut huge = result(1, "");
            huge.user_answer = "word ".repeat(2_000);
            let layout = build(&[huge], &meta());

            let items = all_items(&layout);
            assert!(items.iter().any(|i| i.text.ends_with(ELLIPSIS)));
            for page in &layout.pages {
                for item in &page.items {
                    if !item.text.starts_with("Page ") {
                        assert!(item.y <= TABLE_BOTTOM);
                    }
                }
            }
        }

        #[test]
        fn column_positions_are_identical_across_pages() {
            let layout = build(&many(60), &meta());
            let xs = |page: &PageLayout| {
                let mut xs: Vec<i32> = page
                    .items
                    .iter()
                    .filter(|i| i.size == CELL_SIZE && !i.text.starts_with("Page "))
                    .map(|i| (i.x * 10.0) as i32)
                    .collect();
                xs.sort_unstable();
                xs.dedup();
                xs
            };
            assert_eq!(xs(&layout.pages[0]), xs(&layout.pages[1]));
        }
    }
}
