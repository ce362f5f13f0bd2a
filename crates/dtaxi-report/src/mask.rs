//! Display-only obfuscation of sensitive values.

/// Characters kept at the end of a masked value by default.
pub const DEFAULT_VISIBLE: usize = 2;

pub const MASK_CHAR: char = '*';

/// Mask `value`, keeping its length in characters.
///
/// Values longer than `2 * visible` characters keep their first character
/// and their last `visible` characters; anything shorter is masked
/// entirely.
pub fn mask(value: &str, visible: usize) -> String {
  let len = value.chars().count();
  if len <= visible * 2 {
    return std::iter::repeat_n(MASK_CHAR, len).collect();
  }
  value
    .chars()
    .enumerate()
    .map(|(i, c)| if i == 0 || i >= len - visible { c } else { MASK_CHAR })
    .collect()
}
