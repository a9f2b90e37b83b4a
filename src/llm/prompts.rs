//! Prompt construction for the two generation operations. The prompts ask
//! for a single JSON object so the client can extract a structured payload
//! from free-form completion text.

use crate::llm::language::{detect_language, language_instruction};
use crate::types::{ContentType, GenerationInput};

pub const AD_COPY_SYSTEM: &str = "You are an expert copywriter specializing in Google Ads.";
pub const SEO_SYSTEM: &str = "You are an expert SEO copywriter.";

pub const AD_COPY_TEMPERATURE: f32 = 0.7;
pub const SEO_TEMPERATURE: f32 = 0.8;

/// Cap page text fed into a prompt, on a char boundary.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// The generated copy must match the page's language, so detection looks at
/// every user-supplied field, not just the page text.
fn detected_instruction(input: &GenerationInput) -> &'static str {
    let sample = format!(
        "{} {} {} {}",
        input.page_text, input.keywords, input.brand_name, input.selling_points
    );
    language_instruction(detect_language(&sample))
}

pub fn build_ad_copy_prompt(input: &GenerationInput, max_page_chars: usize) -> String {
    format!(
        "Based on the following content and requirements, generate compelling Google Ads copy:\n\
         \n\
         CONTENT FROM WEBSITE:\n{content}\n\
         \n\
         TARGET KEYWORDS: {keywords}\n\
         BRAND NAME: {brand}\n\
         SELLING POINTS: {selling_points}\n\
         LANGUAGE: {language}\n\
         \n\
         Please generate:\n\
         1. A compelling headline (max 30 characters)\n\
         2. Two description lines (max 90 characters each)\n\
         3. A call-to-action\n\
         \n\
         Format your response as JSON:\n\
         {{\n\
             \"headline\": \"Your headline here\",\n\
             \"description1\": \"First description line\",\n\
             \"description2\": \"Second description line\",\n\
             \"call_to_action\": \"Your CTA here\"\n\
         }}",
        content = excerpt(&input.page_text, max_page_chars),
        keywords = input.keywords,
        brand = input.brand_name,
        selling_points = input.selling_points,
        language = detected_instruction(input),
    )
}

pub fn build_seo_prompt(
    input: &GenerationInput,
    content_type: ContentType,
    variations: u8,
    max_page_chars: usize,
) -> String {
    let instruction = match content_type {
        ContentType::Titles => "Generate only SEO-optimized page titles",
        ContentType::Descriptions => "Generate only meta descriptions",
        ContentType::Both => "Generate both SEO-optimized page titles and meta descriptions",
    };

    format!(
        "Based on the following content, {instruction}:\n\
         \n\
         CONTENT FROM WEBSITE:\n{content}\n\
         \n\
         TARGET KEYWORDS: {keywords}\n\
         BRAND NAME: {brand}\n\
         SELLING POINTS: {selling_points}\n\
         LANGUAGE: {language}\n\
         \n\
         Generate {variations} variations.\n\
         \n\
         Requirements:\n\
         - Titles: 50-60 characters, include primary keywords\n\
         - Descriptions: 150-160 characters, compelling and informative\n\
         - Include brand name where appropriate\n\
         - Optimize for search intent\n\
         \n\
         Format your response as JSON:\n\
         {{\n\
             \"titles\": [\"Title 1\", \"Title 2\"],\n\
             \"descriptions\": [\"Description 1\", \"Description 2\"]\n\
         }}",
        instruction = instruction,
        content = excerpt(&input.page_text, max_page_chars),
        keywords = input.keywords,
        brand = input.brand_name,
        selling_points = input.selling_points,
        language = detected_instruction(input),
        variations = variations,
    )
}
