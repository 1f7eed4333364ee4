//! 資材明細のExcel出力

use crate::error::{Result, WellBomError};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use std::path::Path;
use well_bom_common::MaterialRecord;

const HEADERS: &[(&str, f64)] = &[
    ("№", 5.0),
    ("Наименование", 32.0),
    ("Размер", 16.0),
    ("Кол-во", 9.0),
    ("Ед. изм.", 10.0),
    ("Категория", 18.0),
    ("Достоверность", 14.0),
    ("Примечания", 36.0),
    ("Источники", 28.0),
];

fn sources_text(record: &MaterialRecord) -> String {
    match &record.sources {
        Some(sources) => sources
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        None => record.source.to_string(),
    }
}

/// Excelをバッファに生成
pub fn generate_excel_buffer(materials: &[MaterialRecord], title: &str) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Материалы")?;

    let title_format = Format::new().set_bold().set_font_size(14);
    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_background_color("#D9E1F2");
    let cell_format = Format::new().set_border(FormatBorder::Thin).set_text_wrap();
    let percent_format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_num_format("0%");

    worksheet.write_string_with_format(0, 0, title, &title_format)?;

    let header_row = 2;
    for (col, (header, width)) in HEADERS.iter().enumerate() {
        let col = col as u16;
        worksheet.set_column_width(col, *width)?;
        worksheet.write_string_with_format(header_row, col, *header, &header_format)?;
    }

    for (index, record) in materials.iter().enumerate() {
        let row = header_row + 1 + index as u32;
        worksheet.write_number_with_format(row, 0, (index + 1) as f64, &cell_format)?;
        worksheet.write_string_with_format(row, 1, &record.name, &cell_format)?;
        worksheet.write_string_with_format(row, 2, &record.size, &cell_format)?;
        worksheet.write_number_with_format(row, 3, record.quantity as f64, &cell_format)?;
        worksheet.write_string_with_format(row, 4, &record.unit, &cell_format)?;
        worksheet.write_string_with_format(row, 5, &record.category, &cell_format)?;
        worksheet.write_number_with_format(row, 6, record.confidence, &percent_format)?;
        worksheet.write_string_with_format(row, 7, record.notes.join("; "), &cell_format)?;
        worksheet.write_string_with_format(row, 8, sources_text(record), &cell_format)?;
    }

    workbook.save_to_buffer()
}

pub fn generate_excel(materials: &[MaterialRecord], output_path: &Path, title: &str) -> Result<()> {
    let buffer = generate_excel_buffer(materials, title)
        .map_err(|e| WellBomError::ExcelGeneration(e.to_string()))?;
    std::fs::write(output_path, buffer)?;
    Ok(())
}
