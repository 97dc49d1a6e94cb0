// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Display masking for API keys.

pub const DEFAULT_VISIBLE_CHARS: usize = 4;

const REDACTION_CHAR: char = '*';
/// Middle run between the visible ends.
const MIDDLE_RUN: usize = 8;
/// Output for inputs too short to show any ends.
const FULL_RUN: usize = 16;

/// `first N + "********" + last N` when the input has more than `2N`
/// characters; otherwise a fixed run of 16 redaction characters, so short
/// inputs do not reveal their length.
pub fn mask(plaintext: &str, visible_chars: usize) -> String {
	let chars: Vec<char> = plaintext.chars().collect();
	if chars.len() <= visible_chars.saturating_mul(2) {
		return redaction_run(FULL_RUN);
	}

	let mut out = String::with_capacity(visible_chars * 2 + MIDDLE_RUN);
	out.extend(&chars[..visible_chars]);
	out.push_str(&redaction_run(MIDDLE_RUN));
	out.extend(&chars[chars.len() - visible_chars..]);
	out
}

fn redaction_run(len: usize) -> String {
	REDACTION_CHAR.to_string().repeat(len)
}
