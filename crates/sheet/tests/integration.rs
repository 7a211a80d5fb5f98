use chrono::NaiveDate;
use finmerge_sheet::{
    column_index_to_letters, column_letters_to_index, parse_a1, Book, CellRect, CellValue,
    HorizontalAlign, NumberFormat, Sheet, SheetError, VerticalAlign,
};
use tempfile::tempdir;

// ===== A1 Notation Tests =====

#[test]
fn test_column_letters() {
    assert_eq!(column_letters_to_index("A"), Some(1));
    assert_eq!(column_letters_to_index("Z"), Some(26));
    assert_eq!(column_letters_to_index("AA"), Some(27));
    assert_eq!(column_letters_to_index("xfd"), Some(16_384));
    assert_eq!(column_letters_to_index("ABCD"), None);
    assert_eq!(column_index_to_letters(52), "AZ");
}

#[test]
fn test_absolute_markers_ignored() {
    assert_eq!(parse_a1("$B$5").unwrap(), (5, 2));
    assert_eq!(parse_a1("C$10").unwrap(), (10, 3));
    assert!(matches!(
        parse_a1("5B"),
        Err(SheetError::InvalidCellNotation(_))
    ));
}

#[test]
fn test_rect_clip_to_sheet() {
    let mut sheet = Sheet::with_name("Balance Sheet");
    sheet.set_a1("D12", 1).unwrap();

    let window = CellRect::parse("A1:K50").unwrap();
    let clipped = sheet.clip(&window);
    assert_eq!(clipped.to_string(), "A1:D12");
    assert_eq!(clipped.width(), 4);

    let beyond = sheet.clip(&CellRect::parse("F20:G30").unwrap());
    assert!(beyond.is_empty());
}

// ===== Workbook Tests =====

#[test]
fn test_sheet_lookup_is_case_sensitive() {
    let mut book = Book::new();
    book.add_sheet("Cash Flow Statement", Sheet::new()).unwrap();

    assert!(book.get_sheet("Cash Flow Statement").is_ok());
    assert!(matches!(
        book.get_sheet("cash flow statement"),
        Err(SheetError::SheetNotFound { .. })
    ));
}

// ===== XLSX Tests =====

#[test]
fn test_styles_and_dates_survive_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("styled.xlsx");

    let mut sheet = Sheet::with_name("Income Statement");
    sheet.set_a1("A10", "Revenue").unwrap();
    sheet.set_a1("B10", 1234.5).unwrap();
    sheet
        .set_a1("C10", NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
        .unwrap();
    {
        let cell = sheet.cell_mut(10, 2).unwrap();
        cell.style.number_format = NumberFormat::Fixed2;
        cell.style.align_top_left_wrapped();
    }
    // Styled blank cell.
    sheet.cell_mut(11, 1).unwrap().style.wrap_text = true;

    let mut book = Book::new();
    book.add_sheet("Income Statement", sheet).unwrap();
    book.save_as_xlsx(&path).unwrap();

    let loaded = Book::from_xlsx(&path).unwrap();
    let sheet = loaded.get_sheet("Income Statement").unwrap();
    assert_eq!(sheet.get_a1("B10").unwrap().as_float(), Some(1234.5));
    assert_eq!(
        sheet.get_a1("C10").unwrap(),
        &CellValue::Date(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
    );
    assert!(sheet.is_row_blank(11));
}

#[test]
fn test_formula_cached_result_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("formulas.xlsx");

    let mut sheet = Sheet::with_name("Data");
    sheet.set_a1("A1", 21).unwrap();
    let mut doubled = CellValue::formula("=A1*2");
    doubled.set_cached(CellValue::Float(42.0));
    sheet.set_a1("B1", doubled).unwrap();
    sheet
        .set_formula("C1", "=VLOOKUP(A1,'Other Sheet'!$A$1:$B$9,2,FALSE)")
        .unwrap();

    let mut book = Book::new();
    book.add_sheet("Data", sheet).unwrap();
    book.add_sheet("Other Sheet", Sheet::new()).unwrap();
    book.save_as_xlsx(&path).unwrap();

    let loaded = Book::from_xlsx(&path).unwrap();
    let data = loaded.get_sheet("Data").unwrap();
    let b1 = data.get_a1("B1").unwrap();
    assert_eq!(b1.formula_source(), Some("=A1*2"));
    assert_eq!(b1.as_float(), Some(42.0));
    assert_eq!(
        data.get_a1("C1").unwrap().formula_source(),
        Some("=VLOOKUP(A1,'Other Sheet'!$A$1:$B$9,2,FALSE)")
    );
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let result = Book::from_xlsx(dir.path().join("nope.xlsx"));
    assert!(result.is_err());
}

// ===== Style Tests =====

#[test]
fn test_alignment_helper_keeps_number_format() {
    let mut sheet = Sheet::new();
    let cell = sheet.cell_mut(1, 1).unwrap();
    cell.style.number_format = NumberFormat::Custom("0.000".to_string());
    cell.style.align_top_left_wrapped();

    assert_eq!(cell.style.horizontal, HorizontalAlign::Left);
    assert_eq!(cell.style.vertical, VerticalAlign::Top);
    assert_eq!(cell.style.number_format.code(), "0.000");
    assert!(!cell.style.is_default());
}
