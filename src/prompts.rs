//! Instruction texts appended after the uploaded papers.

/// Report requested from the upload form.
pub const PATTERN_REPORT: &str = "\
You are an expert academic strategist. Analyze these uploaded past questions.

1. TOPIC FREQUENCY: Which topics appear in EVERY paper?
2. THE PATTERN SHIFT: Are questions getting harder or more theoretical?
3. THE 'CHEAT CODE': What 3 topics strictly guarantee a pass?
4. PREDICTION: Generate 3 likely questions for the next exam.

Format the output nicely with headers and bullet points.
";

/// Report requested by the directory scanner, which may have lost files.
pub const PARTIAL_BATCH_REPORT: &str = "\
You are an expert academic strategist. I have uploaded past questions.
Some files might be missing if they failed to upload, so work with what you have.

1. TREND ANALYSIS: What topics appear in these specific files?
2. THE PATTERN SHIFT: Are the questions getting harder?
3. THE 'CHEAT CODE': What 3 topics strictly guarantee a pass?
4. PREDICTION: Generate 3 specific questions likely to appear this year.
";

/// Question extraction for a single paper.
pub const SINGLE_PAPER: &str = "\
Analyze this past question paper.
1. Extract all the questions text.
2. Identify the top 3 topics that appear most frequently.
3. Note if the questions are mostly 'Calculation' based or 'Theory' based.
4. Predict what might come out next based on these patterns.
";
