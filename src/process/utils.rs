use scraper::ElementRef;

/// Text content of a table cell: every descendant text node trimmed
/// (non-breaking spaces included) and concatenated, so
/// `<td> <b>DI1</b>\n</td>` yields `"DI1"`.
pub fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().map(str::trim).collect::<String>()
}
