// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DXF and KML generators
//!
//! Pure formatting over already computed geometry.

pub mod dxf;
pub mod kml;

pub use dxf::{generate_dxf, DxfDocument};
pub use kml::{generate_kml, KmlDocument};

/// Neighbour labels longer than this are shortened
pub const MAX_LABEL_CHARS: usize = 40;

/// Shorten `label` to at most [`MAX_LABEL_CHARS`] characters, ending in `...`
pub fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let mut short: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
    short.push_str("...");
    short
}

/// File name for a download: anything but ASCII letters and digits becomes `_`
pub fn export_file_name(project_name: &str, extension: &str) -> String {
    let stem: String = project_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "parcela".to_string() } else { stem };
    format!("{stem}.{extension}")
}

/// Fixed-point formatting without a `-0.0000`
pub(crate) fn fixed(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let value = if (value * scale).round() == 0.0 { 0.0 } else { value };
    format!("{:.*}", decimals, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("Lote 12"), "Lote 12");
        let long = "Fazenda Santa Maria da Boa Esperança do Norte Ltda";
        let short = truncate_label(long);
        assert_eq!(short.chars().count(), MAX_LABEL_CHARS);
        assert!(short.ends_with("..."));
        assert!(short.starts_with("Fazenda Santa Maria"));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Sítio Boa Vista", "dxf"), "S_tio_Boa_Vista.dxf");
        assert_eq!(export_file_name("", "kml"), "parcela.kml");
    }

    #[test]
    fn test_fixed_negative_zero() {
        assert_eq!(fixed(-1e-12, 4), "0.0000");
        assert_eq!(fixed(-1.5, 4), "-1.5000");
        assert_eq!(fixed(2.0, 2), "2.00");
    }
}
