use growth_mindset::downloader::{convert, to_csv, to_xlsx};
use growth_mindset::error::TableError;
use growth_mindset::loader::{FileFormat, from_csv, from_xlsx, load_table};
use growth_mindset::table::{Cell, ColumnKind, Table};
use rust_xlsxwriter::Workbook;

fn kinds(table: &Table) -> Vec<ColumnKind> {
    table.columns().iter().map(|c| c.kind()).collect()
}

fn scores_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "name").unwrap();
    sheet.write_string(0, 1, "score").unwrap();
    sheet.write_string(1, 0, "Ann").unwrap();
    sheet.write_number(1, 1, 1.5).unwrap();
    sheet.write_string(2, 0, "Bo").unwrap();
    sheet.write_number(2, 1, 2.0).unwrap();
    workbook.save_to_buffer().unwrap()
}

mod csv_loading {
    use super::*;

    #[test]
    fn infers_column_kinds() {
        let table = from_csv(b"a,b,c,d\n1,2.5,x,True\n2,3,y,false\n").unwrap();

        assert_eq!(table.column_names(), vec!["a", "b", "c", "d"]);
        assert_eq!(
            kinds(&table),
            vec![
                ColumnKind::Int,
                ColumnKind::Float,
                ColumnKind::Text,
                ColumnKind::Bool
            ]
        );
        assert_eq!(table.numeric_columns(), vec!["a", "b"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn missing_values_widen_integers_to_float() {
        let table = from_csv(b"a,b\n1,\n,2\n").unwrap();

        assert_eq!(kinds(&table), vec![ColumnKind::Float, ColumnKind::Float]);
        assert_eq!(
            table.numeric_series("a").unwrap(),
            vec![Some(1.0), None]
        );
        assert_eq!(
            table.column("b").unwrap().cells(),
            &[Cell::Empty, Cell::Float(2.0)]
        );
    }

    #[test]
    fn na_markers_are_missing() {
        let table = from_csv(b"v\n1\nNA\nnull\n4\n").unwrap();
        assert_eq!(
            table.numeric_series("v").unwrap(),
            vec![Some(1.0), None, None, Some(4.0)]
        );
    }

    #[test]
    fn strips_byte_order_mark() {
        let table = from_csv("\u{feff}week,score\n1,2\n".as_bytes()).unwrap();
        assert_eq!(table.column_names(), vec!["week", "score"]);
    }

    #[test]
    fn repeated_and_blank_headers_are_made_unique() {
        let table = from_csv(b"a,,a,a.1,a\n1,2,3,4,5\n").unwrap();
        assert_eq!(
            table.column_names(),
            vec!["a", "Unnamed: 1", "a.1", "a.1.1", "a.2"]
        );
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let table = from_csv(b"name,score\n\"Smith, J\",3\n").unwrap();
        assert_eq!(
            table.column("name").unwrap().cells(),
            &[Cell::Text("Smith, J".to_string())]
        );
    }

    #[test]
    fn short_rows_are_padded() {
        let table = from_csv(b"a,b\n1\n2,3\n").unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("b").unwrap().cells()[0], Cell::Empty);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = from_csv(b"").unwrap_err();
        assert!(matches!(err, TableError::Empty));
        assert_eq!(err.to_string(), "No columns to parse from file");
    }

    #[test]
    fn header_without_rows_gives_text_columns() {
        let table = from_csv(b"a,b\n").unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(kinds(&table), vec![ColumnKind::Text, ColumnKind::Text]);
        assert!(table.numeric_columns().is_empty());
    }

    #[test]
    fn all_missing_column_is_float() {
        let table = from_csv(b"a,b\n1,\n2,\n").unwrap();
        assert_eq!(kinds(&table), vec![ColumnKind::Int, ColumnKind::Float]);
    }

    #[test]
    fn long_rows_are_an_error() {
        let err = from_csv(b"a,b\n1,2\n3,4,5\n").unwrap_err();
        match err {
            TableError::RaggedRow {
                expected,
                line,
                found,
            } => {
                assert_eq!(expected, 2);
                assert_eq!(line, 3);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn binary_garbage_is_an_error() {
        let garbage = [0xff, 0xfe, 0x00, 0x9c, 0x13, 0x80, 0xc3, 0x28, b'\n', 0xfa];
        let err = from_csv(&garbage).unwrap_err();
        assert!(matches!(err, TableError::InvalidUtf8 { .. }));
    }
}

mod xlsx_loading {
    use super::*;

    #[test]
    fn reads_first_sheet_with_header() {
        let table = from_xlsx(&scores_workbook()).unwrap();

        assert_eq!(table.column_names(), vec!["name", "score"]);
        assert_eq!(kinds(&table), vec![ColumnKind::Text, ColumnKind::Float]);
        assert_eq!(
            table.numeric_series("score").unwrap(),
            vec![Some(1.5), Some(2.0)]
        );
    }

    #[test]
    fn integral_numbers_read_back_as_integers() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "n").unwrap();
        sheet.write_number(1, 0, 7.0).unwrap();
        sheet.write_number(2, 0, 8.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = from_xlsx(&bytes).unwrap();
        assert_eq!(kinds(&table), vec![ColumnKind::Int]);
        assert_eq!(
            table.column("n").unwrap().cells(),
            &[Cell::Int(7), Cell::Int(8)]
        );
    }

    #[test]
    fn empty_sheet_gives_empty_table() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = from_xlsx(&bytes).unwrap();
        assert!(table.columns().is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let err = from_xlsx(b"definitely not a zip archive").unwrap_err();
        assert!(matches!(err, TableError::Xlsx(_)));
    }
}

mod format_detection {
    use super::*;

    #[test]
    fn detects_by_suffix_ignoring_case() {
        assert_eq!(FileFormat::from_file_name("a.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_file_name("A.CSV").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_file_name("b.xlsx").unwrap(), FileFormat::Xlsx);
        assert!(matches!(
            FileFormat::from_file_name("c.xls"),
            Err(TableError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn load_table_dispatches_on_suffix() {
        let from_csv_name = load_table("s.csv", b"a\n1\n").unwrap();
        assert_eq!(from_csv_name.numeric_columns(), vec!["a"]);

        let from_xlsx_name = load_table("s.xlsx", &scores_workbook()).unwrap();
        assert_eq!(from_xlsx_name.column_names(), vec!["name", "score"]);

        // CSV bytes under an .xlsx name are parsed as a workbook and fail
        assert!(load_table("s.xlsx", b"a\n1\n").is_err());
    }
}

mod writing {
    use super::*;

    #[test]
    fn csv_output_matches_data_frame_conventions() {
        let table = from_csv(b"i,f,b,t\n1,1,True,\"x, y\"\n2,2.5,False,z\n").unwrap();
        let csv = to_csv(&table).unwrap();
        assert_eq!(csv, "i,f,b,t\n1,1.0,True,\"x, y\"\n2,2.5,False,z\n");
    }

    #[test]
    fn xlsx_output_keeps_digits_of_large_integers() {
        let table = from_csv(b"id,n\n9007199254740993,1\n-9223372036854775808,2\n").unwrap();
        let back = from_xlsx(&to_xlsx(&table).unwrap()).unwrap();

        assert_eq!(
            back.column("id").unwrap().cells(),
            &[
                Cell::Text("9007199254740993".to_string()),
                Cell::Text("-9223372036854775808".to_string())
            ]
        );
        assert_eq!(back.column("n").unwrap().cells(), &[Cell::Int(1), Cell::Int(2)]);
    }

    #[test]
    fn xlsx_output_round_trips_through_reader() {
        let table = from_csv(b"label,value\nfirst,10\nsecond,\n").unwrap();
        let bytes = to_xlsx(&table).unwrap();
        let back = from_xlsx(&bytes).unwrap();

        assert_eq!(back.column_names(), vec!["label", "value"]);
        assert_eq!(
            back.numeric_series("value").unwrap(),
            vec![Some(10.0), None]
        );
    }
}

mod conversion {
    use super::*;

    #[test]
    fn csv_to_xlsx_round_trip_keeps_names_and_values() {
        let converted = convert("numbers.csv", b"a,b\n1,2\n3,4\n").unwrap();
        assert_eq!(converted.file_name, "converted_file.xlsx");
        assert_eq!(
            converted.content_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );

        let back = from_xlsx(&converted.bytes).unwrap();
        assert_eq!(back.column_names(), vec!["a", "b"]);
        assert_eq!(
            back.numeric_series("a").unwrap(),
            vec![Some(1.0), Some(3.0)]
        );
        assert_eq!(
            back.numeric_series("b").unwrap(),
            vec![Some(2.0), Some(4.0)]
        );
    }

    #[test]
    fn xlsx_to_csv() {
        let converted = convert("scores.xlsx", &scores_workbook()).unwrap();
        assert_eq!(converted.file_name, "converted_file.csv");
        assert_eq!(converted.content_type, "text/csv");
        assert_eq!(
            String::from_utf8(converted.bytes).unwrap(),
            "name,score\nAnn,1.5\nBo,2.0\n"
        );
    }

    #[test]
    fn parse_failures_are_reported() {
        assert!(matches!(
            convert("broken.csv", &[0xff, 0xfe, 0xfd]),
            Err(TableError::InvalidUtf8 { .. })
        ));
        assert!(matches!(
            convert("notes.txt", b"a,b\n"),
            Err(TableError::UnsupportedFileType(_))
        ));
    }
}
