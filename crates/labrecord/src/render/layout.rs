//! Page layout for the PDF lab record.
//!
//! Layout is computed as a display list in millimetres with the origin at the
//! top-left of the page and `y` growing downwards; text `y` is the baseline.
//! The PDF backend only translates these operations, so everything about
//! pagination can be tested without producing a PDF.

use super::format_date_display;
use super::metrics::{fold_to_ascii, wrap_text, FontFace};
use crate::model::{ExperimentRecord, FormSnapshot};

/// A4 width.
pub const PAGE_WIDTH_MM: f32 = 210.0;
/// A4 height.
pub const PAGE_HEIGHT_MM: f32 = 297.0;
/// Left page margin.
pub const MARGIN_LEFT_MM: f32 = 15.0;
/// Right page margin.
pub const MARGIN_RIGHT_MM: f32 = 15.0;
/// Top page margin.
pub const MARGIN_TOP_MM: f32 = 12.0;
/// Bottom page margin.
pub const MARGIN_BOTTOM_MM: f32 = 15.0;

/// Data rows that fit on one page.
pub const ROWS_PER_PAGE: usize = 6;

const HEADER_ROW_HEIGHT_MM: f32 = 9.0;
const ROW_HEIGHT_MM: f32 = 28.0;

const LOGO_WIDTH_MM: f32 = 100.0;
const LOGO_HEIGHT_MM: f32 = 20.0;
const LOGO_GAP_MM: f32 = 6.0;
const LOGO_RESERVE_MM: f32 = 24.0;

const COURSE_TITLE_SIZE: f32 = 18.0;
const COURSE_TITLE_ADVANCE_MM: f32 = 7.0;
const CONTENTS_LABEL: &str = "Table of Contents";
const CONTENTS_SIZE: f32 = 14.0;
const CONTENTS_ADVANCE_MM: f32 = 6.0;

const TABLE_HEADER_SIZE: f32 = 10.0;
const CELL_SIZE: f32 = 10.0;
const CELL_PADDING_MM: f32 = 2.0;
const CELL_TEXT_TOP_MM: f32 = 6.0;
const LINE_STEP_MM: f32 = 4.0;
const TITLE_LINK_GAP_MM: f32 = 1.0;
const MAX_TITLE_LINES: usize = 3;
const MAX_LINK_LINES: usize = 3;
const QR_INSET_MM: f32 = 6.0;

const CONFIRMATION_GAP_MM: f32 = 10.0;
const CONFIRMATION_HEIGHT_MM: f32 = 20.0;
const CONFIRMATION_TOP_GAP_MM: f32 = 8.0;
const CONFIRMATION_SIZE: f32 = 11.0;
const DETAIL_LINE_STEP_MM: f32 = 7.0;
const NAME_BLANK: &str = "________________________";
const SHORT_BLANK: &str = "____________";

/// Colour of text, as 8-bit RGB.
pub type Rgb8 = (u8, u8, u8);

/// Body text colour.
pub const TEXT_COLOR: Rgb8 = (0, 0, 0);
/// Hyperlink colour.
pub const LINK_COLOR: Rgb8 = (0, 0, 238);

/// The six table columns, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Serial number.
    Number,
    /// Experiment date.
    Date,
    /// Title and link.
    Title,
    /// QR code image.
    Qr,
    /// Marks.
    Marks,
    /// Staff signature (left blank).
    Signature,
}

impl Column {
    /// All columns, left to right.
    pub const ALL: [Self; 6] = [
        Self::Number,
        Self::Date,
        Self::Title,
        Self::Qr,
        Self::Marks,
        Self::Signature,
    ];

    /// Header cell label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Number => "S. No",
            Self::Date => "Date",
            Self::Title => "Experiment Title",
            Self::Qr => "QR Code",
            Self::Marks => "Marks",
            Self::Signature => "Signature",
        }
    }

    /// Width in millimetres. Signature takes whatever the others leave.
    #[must_use]
    pub fn width(self) -> f32 {
        match self {
            Self::Number => 13.0,
            Self::Date => 20.0,
            Self::Title => 75.0,
            Self::Qr => 30.0,
            Self::Marks => 20.0,
            Self::Signature => {
                table_width()
                    - (Self::Number.width()
                        + Self::Date.width()
                        + Self::Title.width()
                        + Self::Qr.width()
                        + Self::Marks.width())
            }
        }
    }

    /// Left edge in millimetres.
    #[must_use]
    pub fn x(self) -> f32 {
        MARGIN_LEFT_MM
            + Self::ALL
                .iter()
                .take_while(|c| **c != self)
                .map(|c| c.width())
                .sum::<f32>()
    }

    /// Horizontal centre in millimetres.
    #[must_use]
    pub fn center_x(self) -> f32 {
        self.x() + self.width() / 2.0
    }
}

/// Printable width between the side margins.
#[must_use]
pub fn table_width() -> f32 {
    PAGE_WIDTH_MM - MARGIN_LEFT_MM - MARGIN_RIGHT_MM
}

/// Horizontal anchoring of a text run relative to its `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// `x` is the left edge.
    Left,
    /// `x` is the centre.
    Center,
    /// `x` is the right edge.
    Right,
}

/// A single line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    /// The text.
    pub text: String,
    /// Anchor x, see `align`.
    pub x: f32,
    /// Baseline y from the top of the page.
    pub y: f32,
    /// Font size in points.
    pub size: f32,
    /// Font face.
    pub face: FontFace,
    /// Anchoring.
    pub align: Align,
    /// Fill colour.
    pub color: Rgb8,
    /// Hyperlink target for this run.
    pub link: Option<String>,
}

/// One drawing operation. Boxes are given by their top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A line of text.
    Text(TextOp),
    /// A stroked rectangle (table cell border).
    Rect {
        /// Left edge.
        x: f32,
        /// Top edge.
        y: f32,
        /// Width.
        width: f32,
        /// Height.
        height: f32,
    },
    /// The institution logo.
    Logo {
        /// Left edge.
        x: f32,
        /// Top edge.
        y: f32,
        /// Width.
        width: f32,
        /// Height.
        height: f32,
    },
    /// A square QR code for an experiment's link.
    QrCode {
        /// 0-based experiment index.
        experiment: usize,
        /// Text to encode.
        payload: String,
        /// Left edge.
        x: f32,
        /// Top edge.
        y: f32,
        /// Side length.
        size: f32,
    },
}

/// Everything drawn on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    /// Operations in paint order.
    pub ops: Vec<DrawOp>,
    /// 0-based indices of the experiments whose rows are on this page.
    pub rows: Vec<usize>,
}

impl PageLayout {
    /// Text runs on this page.
    pub fn texts(&self) -> impl Iterator<Item = &TextOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(text) => Some(text),
            _ => None,
        })
    }

    /// True if the page starts with the logo.
    #[must_use]
    pub fn has_logo(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Logo { .. }))
    }
}

/// A laid-out document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentLayout {
    /// Pages in order; never empty.
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All operations across pages.
    pub fn ops(&self) -> impl Iterator<Item = &DrawOp> {
        self.pages.iter().flat_map(|p| p.ops.iter())
    }

    /// Experiment indices that received a QR code.
    #[must_use]
    pub fn qr_experiments(&self) -> Vec<usize> {
        self.ops()
            .filter_map(|op| match op {
                DrawOp::QrCode { experiment, .. } => Some(*experiment),
                _ => None,
            })
            .collect()
    }
}

/// Inputs to layout besides the form itself.
#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions<'a> {
    /// Whether a logo image is available for the first page.
    pub logo: bool,
    /// Statement printed above the student details.
    pub confirmation_statement: &'a str,
}

/// Lay out `snapshot` as a paginated lab record.
#[must_use]
pub fn layout_document(snapshot: &FormSnapshot, options: LayoutOptions<'_>) -> DocumentLayout {
    layout_with_row_height(snapshot, options, ROW_HEIGHT_MM)
}

fn layout_with_row_height(
    snapshot: &FormSnapshot,
    options: LayoutOptions<'_>,
    row_height: f32,
) -> DocumentLayout {
    let mut builder = Builder {
        snapshot,
        options,
        row_height,
        pages: Vec::new(),
        rows_on_page: 0,
        data_start_y: 0.0,
        last_row_bottom: MARGIN_TOP_MM,
    };

    builder.start_table_page();
    for (index, experiment) in snapshot.experiments.iter().enumerate() {
        if builder.rows_on_page == ROWS_PER_PAGE {
            builder.start_table_page();
        }
        builder.row(index, experiment);
    }
    builder.confirmation();

    DocumentLayout {
        pages: builder.pages,
    }
}

struct Builder<'a> {
    snapshot: &'a FormSnapshot,
    options: LayoutOptions<'a>,
    row_height: f32,
    pages: Vec<PageLayout>,
    rows_on_page: usize,
    data_start_y: f32,
    last_row_bottom: f32,
}

impl Builder<'_> {
    fn page(&mut self) -> &mut PageLayout {
        if self.pages.is_empty() {
            self.pages.push(PageLayout::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn push(&mut self, op: DrawOp) {
        self.page().ops.push(op);
    }

    fn text(
        &mut self,
        text: impl Into<String>,
        x: f32,
        y: f32,
        size: f32,
        face: FontFace,
        align: Align,
    ) {
        self.push(DrawOp::Text(TextOp {
            text: fold_to_ascii(&text.into()).into_owned(),
            x,
            y,
            size,
            face,
            align,
            color: TEXT_COLOR,
            link: None,
        }));
    }

    fn start_table_page(&mut self) {
        let first = self.pages.is_empty();
        self.pages.push(PageLayout::default());
        let header_bottom = self.header(first);
        self.table_header(header_bottom);
        self.data_start_y = header_bottom + HEADER_ROW_HEIGHT_MM;
        self.rows_on_page = 0;
        self.last_row_bottom = self.data_start_y;
    }

    /// Logo (first page only), course title and contents label. Returns the y
    /// just below them.
    fn header(&mut self, first_page: bool) -> f32 {
        let mut y = MARGIN_TOP_MM;

        if first_page {
            if self.options.logo {
                self.push(DrawOp::Logo {
                    x: (PAGE_WIDTH_MM - LOGO_WIDTH_MM) / 2.0,
                    y,
                    width: LOGO_WIDTH_MM,
                    height: LOGO_HEIGHT_MM,
                });
                y += LOGO_HEIGHT_MM + LOGO_GAP_MM;
            } else {
                y += LOGO_RESERVE_MM;
            }
        }

        let center = PAGE_WIDTH_MM / 2.0;
        if !self.snapshot.course_title.is_empty() {
            let title = self.snapshot.course_title.clone();
            self.text(
                title,
                center,
                y,
                COURSE_TITLE_SIZE,
                FontFace::Bold,
                Align::Center,
            );
        }
        y += COURSE_TITLE_ADVANCE_MM;

        self.text(
            CONTENTS_LABEL,
            center,
            y,
            CONTENTS_SIZE,
            FontFace::Bold,
            Align::Center,
        );
        y + CONTENTS_ADVANCE_MM
    }

    fn table_header(&mut self, top: f32) {
        let baseline = top + HEADER_ROW_HEIGHT_MM / 2.0 + 0.5;
        for column in Column::ALL {
            self.push(DrawOp::Rect {
                x: column.x(),
                y: top,
                width: column.width(),
                height: HEADER_ROW_HEIGHT_MM,
            });
        }
        for column in Column::ALL {
            self.text(
                column.label(),
                column.center_x(),
                baseline,
                TABLE_HEADER_SIZE,
                FontFace::Bold,
                Align::Center,
            );
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn row(&mut self, index: usize, experiment: &ExperimentRecord) {
        let top = self.data_start_y + self.rows_on_page as f32 * self.row_height;
        let middle = top + self.row_height / 2.0;

        for column in Column::ALL {
            self.push(DrawOp::Rect {
                x: column.x(),
                y: top,
                width: column.width(),
                height: self.row_height,
            });
        }

        self.text(
            (index + 1).to_string(),
            Column::Number.center_x(),
            middle,
            CELL_SIZE,
            FontFace::Regular,
            Align::Center,
        );

        let date = format_date_display(&experiment.date);
        if !date.is_empty() {
            self.text(
                date,
                Column::Date.center_x(),
                middle,
                CELL_SIZE,
                FontFace::Regular,
                Align::Center,
            );
        }

        self.title_cell(experiment, top);

        if !experiment.marks.is_empty() {
            self.text(
                experiment.marks.clone(),
                Column::Marks.center_x(),
                middle,
                CELL_SIZE,
                FontFace::Regular,
                Align::Center,
            );
        }

        let link = experiment.link.trim();
        if !link.is_empty() {
            let size = Column::Qr.width() - QR_INSET_MM;
            self.push(DrawOp::QrCode {
                experiment: index,
                payload: link.to_string(),
                x: Column::Qr.center_x() - size / 2.0,
                y: middle - size / 2.0,
                size,
            });
        }

        self.page().rows.push(index);
        self.rows_on_page += 1;
        self.last_row_bottom = top + self.row_height;
    }

    /// Title (bold) over link (blue, hyperlinked), each capped at three lines.
    fn title_cell(&mut self, experiment: &ExperimentRecord, top: f32) {
        let x = Column::Title.x() + CELL_PADDING_MM;
        let max_width = Column::Title.width() - 2.0 * CELL_PADDING_MM;
        let mut y = top + CELL_TEXT_TOP_MM;

        if !experiment.title.is_empty() {
            let title = fold_to_ascii(&experiment.title);
            let lines = wrap_text(&title, FontFace::Bold, CELL_SIZE, max_width);
            for line in lines.into_iter().take(MAX_TITLE_LINES) {
                self.text(line, x, y, CELL_SIZE, FontFace::Bold, Align::Left);
                y += LINE_STEP_MM;
            }
            y += TITLE_LINK_GAP_MM;
        }

        if !experiment.link.is_empty() {
            let link = fold_to_ascii(&experiment.link);
            let lines = wrap_text(&link, FontFace::Regular, CELL_SIZE, max_width);
            for line in lines.into_iter().take(MAX_LINK_LINES) {
                self.push(DrawOp::Text(TextOp {
                    text: line,
                    x,
                    y,
                    size: CELL_SIZE,
                    face: FontFace::Regular,
                    align: Align::Left,
                    color: LINK_COLOR,
                    link: Some(experiment.link.clone()),
                }));
                y += LINE_STEP_MM;
            }
        }
    }

    fn confirmation(&mut self) {
        let mut start = self.last_row_bottom + CONFIRMATION_GAP_MM;

        if start + CONFIRMATION_HEIGHT_MM > PAGE_HEIGHT_MM - MARGIN_BOTTOM_MM {
            self.pages.push(PageLayout::default());
            start = self.header(false) + CONFIRMATION_TOP_GAP_MM;
        }

        let statement = self.options.confirmation_statement.to_string();
        self.text(
            statement,
            MARGIN_LEFT_MM,
            start,
            CONFIRMATION_SIZE,
            FontFace::Bold,
            Align::Left,
        );

        let snapshot = self.snapshot;
        let name = or_blank(snapshot.student_name.trim(), NAME_BLANK);
        let register = or_blank(snapshot.register_number.trim(), SHORT_BLANK);
        let date = format_date_display(snapshot.confirm_date.trim());
        let date = or_blank(&date, SHORT_BLANK);

        let first_line = start + DETAIL_LINE_STEP_MM;
        let second_line = start + 2.0 * DETAIL_LINE_STEP_MM;
        self.text(
            format!("Name: {name}"),
            MARGIN_LEFT_MM,
            first_line,
            CONFIRMATION_SIZE,
            FontFace::Regular,
            Align::Left,
        );
        self.text(
            format!("Register Number: {register}"),
            PAGE_WIDTH_MM - MARGIN_RIGHT_MM,
            first_line,
            CONFIRMATION_SIZE,
            FontFace::Regular,
            Align::Right,
        );
        self.text(
            format!("Date: {date}"),
            MARGIN_LEFT_MM,
            second_line,
            CONFIRMATION_SIZE,
            FontFace::Regular,
            Align::Left,
        );
    }
}

fn or_blank<'a>(value: &'a str, blank: &'a str) -> &'a str {
    if value.is_empty() {
        blank
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str = "I confirm.";

    fn options(logo: bool) -> LayoutOptions<'static> {
        LayoutOptions {
            logo,
            confirmation_statement: STATEMENT,
        }
    }

    fn experiments(n: usize) -> FormSnapshot {
        FormSnapshot {
            course_title: "CS101 - Intro".into(),
            experiments: (0..n)
                .map(|i| ExperimentRecord {
                    title: format!("Experiment {}", i + 1),
                    ..ExperimentRecord::default()
                })
                .collect(),
            ..FormSnapshot::default()
        }
    }

    fn find_text<'a>(layout: &'a DocumentLayout, needle: &str) -> Vec<(usize, &'a TextOp)> {
        layout
            .pages
            .iter()
            .enumerate()
            .flat_map(|(i, p)| p.texts().map(move |t| (i, t)))
            .filter(|(_, t)| t.text.contains(needle))
            .collect()
    }

    #[test]
    fn test_column_widths_fill_printable_width() {
        let total: f32 = Column::ALL.iter().map(|c| c.width()).sum();
        assert!((total - table_width()).abs() < 1e-4);
        assert!((Column::Signature.width() - 22.0).abs() < 1e-4);
    }

    #[test]
    fn test_column_positions() {
        assert!((Column::Number.x() - 15.0).abs() < 1e-4);
        assert!((Column::Title.x() - 48.0).abs() < 1e-4);
        assert!((Column::Signature.x() + Column::Signature.width() - 195.0).abs() < 1e-4);
    }

    #[test]
    fn test_page_counts_at_six_row_boundary() {
        for (rows, pages) in [(0, 1), (1, 1), (6, 1), (7, 2), (12, 2), (13, 3)] {
            let layout = layout_document(&experiments(rows), options(false));
            assert_eq!(layout.page_count(), pages, "{rows} rows");
        }
    }

    #[test]
    fn test_rows_are_split_six_per_page() {
        let layout = layout_document(&experiments(7), options(false));
        assert_eq!(layout.pages[0].rows, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(layout.pages[1].rows, vec![6]);
    }

    #[test]
    fn test_header_repeats_without_logo() {
        let layout = layout_document(&experiments(7), options(true));
        assert!(layout.pages[0].has_logo());
        assert!(!layout.pages[1].has_logo());

        let contents = find_text(&layout, CONTENTS_LABEL);
        assert_eq!(contents.len(), 2);
        let headers = find_text(&layout, "Experiment Title");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_logo_shifts_first_page_by_two_mm() {
        let with_logo = layout_document(&experiments(0), options(true));
        let without = layout_document(&experiments(0), options(false));

        let y_with = find_text(&with_logo, "CS101")[0].1.y;
        let y_without = find_text(&without, "CS101")[0].1.y;
        assert!((y_with - 38.0).abs() < 1e-4);
        assert!((y_without - 36.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_course_title_is_not_drawn() {
        let mut snapshot = experiments(1);
        snapshot.course_title.clear();
        let layout = layout_document(&snapshot, options(false));
        let title_runs = layout
            .ops()
            .filter(|op| matches!(op, DrawOp::Text(t) if (t.size - COURSE_TITLE_SIZE).abs() < 1e-4))
            .count();
        assert_eq!(title_runs, 0);
        assert_eq!(find_text(&layout, CONTENTS_LABEL).len(), 1);
    }

    #[test]
    fn test_row_numbers_continue_across_pages() {
        let layout = layout_document(&experiments(7), options(false));
        let seventh = layout.pages[1]
            .texts()
            .find(|t| t.text == "7" && t.align == Align::Center);
        assert!(seventh.is_some());
    }

    #[test]
    fn test_link_without_title_gets_qr() {
        let snapshot = FormSnapshot {
            experiments: vec![ExperimentRecord {
                link: "https://github.com/ada/lab1".into(),
                ..ExperimentRecord::default()
            }],
            ..FormSnapshot::default()
        };
        let layout = layout_document(&snapshot, options(false));
        assert_eq!(layout.qr_experiments(), vec![0]);
    }

    #[test]
    fn test_title_without_link_gets_no_qr() {
        let layout = layout_document(&experiments(3), options(false));
        assert!(layout.qr_experiments().is_empty());
        assert!(layout
            .ops()
            .all(|op| !matches!(op, DrawOp::Text(t) if t.link.is_some())));
    }

    #[test]
    fn test_qr_is_centered_in_its_cell() {
        let snapshot = FormSnapshot {
            experiments: vec![ExperimentRecord {
                link: "https://x.io".into(),
                ..ExperimentRecord::default()
            }],
            ..FormSnapshot::default()
        };
        let layout = layout_document(&snapshot, options(false));
        let (x, size) = layout
            .ops()
            .find_map(|op| match op {
                DrawOp::QrCode { x, size, .. } => Some((*x, *size)),
                _ => None,
            })
            .unwrap();
        assert!((size - 24.0).abs() < 1e-4);
        assert!((x + size / 2.0 - Column::Qr.center_x()).abs() < 1e-4);
    }

    #[test]
    fn test_long_title_truncated_to_three_lines() {
        let snapshot = FormSnapshot {
            experiments: vec![ExperimentRecord {
                title: "word ".repeat(80),
                link: format!("https://example.com/{}", "x".repeat(300)),
                ..ExperimentRecord::default()
            }],
            ..FormSnapshot::default()
        };
        let layout = layout_document(&snapshot, options(false));
        let title_lines = find_text(&layout, "word")
            .iter()
            .filter(|(_, t)| t.face == FontFace::Bold)
            .count();
        let link_lines = layout
            .ops()
            .filter(|op| matches!(op, DrawOp::Text(t) if t.link.is_some()))
            .count();
        assert_eq!(title_lines, MAX_TITLE_LINES);
        assert_eq!(link_lines, MAX_LINK_LINES);
    }

    #[test]
    fn test_link_text_is_blue_and_hyperlinked() {
        let snapshot = FormSnapshot {
            experiments: vec![ExperimentRecord {
                title: "Sorting".into(),
                link: "https://github.com/ada/sort".into(),
                ..ExperimentRecord::default()
            }],
            ..FormSnapshot::default()
        };
        let layout = layout_document(&snapshot, options(false));
        let (_, link) = find_text(&layout, "github.com")[0];
        assert_eq!(link.color, LINK_COLOR);
        assert_eq!(link.link.as_deref(), Some("https://github.com/ada/sort"));

        let (_, title) = find_text(&layout, "Sorting")[0];
        assert!(link.y > title.y);
    }

    #[test]
    fn test_dates_are_displayed_day_first() {
        let snapshot = FormSnapshot {
            confirm_date: "2024-06-30".into(),
            experiments: vec![ExperimentRecord {
                date: "2024-01-15".into(),
                ..ExperimentRecord::default()
            }],
            ..FormSnapshot::default()
        };
        let layout = layout_document(&snapshot, options(false));
        assert_eq!(find_text(&layout, "15-01-2024").len(), 1);
        assert_eq!(find_text(&layout, "Date: 30-06-2024").len(), 1);
    }

    #[test]
    fn test_confirmation_uses_blanks_for_missing_details() {
        let layout = layout_document(&experiments(0), options(false));
        assert_eq!(find_text(&layout, &format!("Name: {NAME_BLANK}")).len(), 1);
        assert_eq!(find_text(&layout, &format!("Register Number: {SHORT_BLANK}")).len(), 1);
        assert_eq!(find_text(&layout, &format!("Date: {SHORT_BLANK}")).len(), 1);
        assert_eq!(find_text(&layout, STATEMENT).len(), 1);
    }

    #[test]
    fn test_register_number_is_right_aligned_at_margin() {
        let mut snapshot = experiments(0);
        snapshot.register_number = "21CS042".into();
        let layout = layout_document(&snapshot, options(false));
        let (_, reg) = find_text(&layout, "Register Number: 21CS042")[0];
        assert_eq!(reg.align, Align::Right);
        assert!((reg.x - 195.0).abs() < 1e-4);
    }

    #[test]
    fn test_confirmation_follows_last_row() {
        let layout = layout_document(&experiments(6), options(false));
        let (page, statement) = find_text(&layout, STATEMENT)[0];
        assert_eq!(page, 0);
        // 36 title + 7 + 6 = 49 header top, 58 data start, 6 rows, then 10mm.
        assert!((statement.y - (58.0 + 6.0 * 28.0 + 10.0)).abs() < 1e-4);
    }

    #[test]
    fn test_confirmation_moves_to_new_page_when_it_does_not_fit() {
        // Six 35mm rows end at 268mm; the block would run past 282mm.
        let layout = layout_with_row_height(&experiments(6), options(true), 35.0);
        assert_eq!(layout.page_count(), 2);

        let (page, statement) = find_text(&layout, STATEMENT)[0];
        assert_eq!(page, 1);
        // Header without logo: title at 12, label at 19, bottom at 25, then 8mm.
        assert!((statement.y - 33.0).abs() < 1e-4);

        let overflow = &layout.pages[1];
        assert!(!overflow.has_logo());
        assert!(overflow.rows.is_empty());
        assert!(overflow.texts().any(|t| t.text == "CS101 - Intro"));
        assert!(overflow.texts().any(|t| t.text == CONTENTS_LABEL));
        assert!(layout.pages[0].has_logo());
    }

    #[test]
    fn test_confirmation_stays_when_it_just_fits() {
        // 58 + 6 * 32 + 10 = 260; the block ends at 280mm.
        let layout = layout_with_row_height(&experiments(6), options(false), 32.0);
        assert_eq!(layout.page_count(), 1);
        let (_, statement) = find_text(&layout, STATEMENT)[0];
        assert!((statement.y - 260.0).abs() < 1e-4);
    }

    #[test]
    fn test_non_ascii_text_is_folded_for_builtin_fonts() {
        let mut snapshot = experiments(1);
        snapshot.course_title = "Chimie – Étude".into();
        snapshot.experiments[0].title = "Café “Lab”".into();
        let layout = layout_document(&snapshot, options(false));
        assert_eq!(find_text(&layout, "Chimie - Etude").len(), 1);
        assert_eq!(find_text(&layout, "Cafe \"Lab\"").len(), 1);
        assert!(layout.ops().all(|op| match op {
            DrawOp::Text(t) => t.text.is_ascii(),
            _ => true,
        }));
    }

    #[test]
    fn test_confirmation_directly_under_header_without_rows() {
        let layout = layout_document(&experiments(0), options(false));
        let (_, statement) = find_text(&layout, STATEMENT)[0];
        assert!((statement.y - 68.0).abs() < 1e-4);
    }
}
