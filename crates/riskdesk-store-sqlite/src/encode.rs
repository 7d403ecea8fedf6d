//! Encoding helpers between row cells and the JSON text stored in SQLite.

use crate::Result;

pub fn encode_cells(cells: &[String]) -> Result<String> {
  Ok(serde_json::to_string(cells)?)
}

pub fn decode_cells(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cells_with_commas_and_quotes_survive() {
    let cells = vec!["a,b".to_string(), "say \"hi\"".to_string(), String::new()];
    let encoded = encode_cells(&cells).unwrap();
    assert_eq!(decode_cells(&encoded).unwrap(), cells);
  }

  #[test]
  fn malformed_cells_are_an_error() {
    assert!(decode_cells("not json").is_err());
  }
}
