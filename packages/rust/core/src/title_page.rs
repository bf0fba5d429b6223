//! Title page block placed at the start of the combined document.

use std::path::Path;

use chrono::NaiveDate;

use topicpress_markdown::PAGE_BREAK;

/// Long-form date, e.g. `Monday, October 19, 2026`.
pub fn format_generation_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Build the centered title block: logo, `<name> <version>` heading and the
/// generation date, followed by a page break.
pub fn build_title_page(
    display_name: &str,
    version: &str,
    logo: &Path,
    generated_on: NaiveDate,
) -> String {
    let date = format_generation_date(generated_on);
    let logo = logo.display();

    format!(
        r#"

<div align="center">
    <br><br><br><br><br><br><br>
    <img src="{logo}" height="300">
    <br><br><br>
    <h1>{display_name} {version}<br>Documentation</h1>
    <br><br><br>
    <p>Generated on:<br>{date}</p>
</div>

{PAGE_BREAK}

"#
    )
}
