#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use encoding_rs::UTF_8;
use order_insights::dataset::{Dataset, load_from_reader};
use tempfile::{TempDir, tempdir};

pub const HEADER: &str = "order_id,order_datetime,order_month,department,category,brand,sku_id,city,city_zone,channel,nationality_group,age,loyalty_member,quantity,line_value_aed,basket_size_items";

/// Twelve order lines across eight orders. 2024-03-04 is a Monday; nothing
/// falls on a Sunday.
pub const SAMPLE_ROWS: &[&str] = &[
    "1001,2024-03-04 09:15:00,2024-03,Grocery,Dairy,Almarai,SKU-100,Dubai,Deira,online,Arab,34,1,2,24.50,4",
    "1001,2024-03-04 09:15:00,2024-03,Grocery,Bakery,Lusine,SKU-101,Dubai,Deira,online,Arab,34,1,1,8.00,4",
    "1002,2024-03-05 18:40:00,2024-03,Electronics,Phones,Samsung,SKU-200,Abu Dhabi,Khalidiya,offline,Asian,41,0,1,1899.00,1",
    "1003,2024-03-06 12:05:00,2024-03,Grocery,Dairy,Almarai,SKU-100,Sharjah,Al Nahda,online,Western,27,1,3,36.75,6",
    "1003,2024-03-06 12:05:00,2024-03,Home,Kitchen,Tefal,SKU-300,Sharjah,Al Nahda,online,Western,27,1,1,,6",
    "1004,2024-04-11 20:30:00,2024-04,Electronics,Audio,Sony,SKU-201,Dubai,Marina,online,Asian,52,0,1,349.00,2",
    "1005,2024-04-12 10:00:00,2024-04,Grocery,Produce,Farm Fresh,SKU-102,Ajman,Al Nuaimiya,offline,Arab,63,1,5,17.25,9",
    "1005,2024-04-12 10:00:00,2024-04,Home,Cleaning,Fairy,SKU-301,Ajman,Al Nuaimiya,offline,Arab,63,1,2,n/a,9",
    "1006,2024-04-13 16:45:00,2024-04,Fashion,Shoes,Skechers,SKU-400,Dubai,Deira,offline,Western,19,0,1,210.00,1",
    "1007,not-a-date,2024-05,Grocery,Dairy,Almarai,SKU-100,Dubai,Marina,online,Asian,45,1,2,24.50,2",
    "1008,2024-05-02 08:20:00,May 2024,Electronics,Phones,Apple,SKU-202,Abu Dhabi,Khalidiya,online,Arab,38,1,1,3499.00,3",
    "1008,2024-05-02 08:20:00,May 2024,Grocery,Bakery,Lusine,SKU-101,Abu Dhabi,Khalidiya,online,Arab,38,1,4,32.00,3",
];

pub fn csv_text(rows: &[&str]) -> String {
    let mut text = String::from(HEADER);
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

pub fn sample_dataset() -> Dataset {
    dataset_from_rows(SAMPLE_ROWS)
}

pub fn dataset_from_rows(rows: &[&str]) -> Dataset {
    dataset_from_text(&csv_text(rows))
}

pub fn dataset_from_text(text: &str) -> Dataset {
    load_from_reader(text.as_bytes(), b',', UTF_8, Path::new("inline.csv"))
        .expect("load inline dataset")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the shared sample dataset and returns its path.
    pub fn write_sample(&self) -> PathBuf {
        self.write("orders.csv", &csv_text(SAMPLE_ROWS))
    }
}
