//! Prompt material and user-facing copy.
//!
//! The system instruction is a fixed policy document sent with every
//! refinement call; the research instruction is templated from the request.
//! User-facing failure messages are the product's Korean copy and are
//! surfaced verbatim by the API.

use crate::models::GenerationRequest;

pub const SYSTEM_INSTRUCTION: &str = r#"
Role: You are an expert USANA Product Visual Specialist and Image Prompt Engineer.

Task: Convert a USANA product name into a hyper-realistic miniature photography prompt with a "Busy Swarm" of workers and a LUSH ENVIRONMENT of raw ingredients.

Language Rule: If the user provides a product name in Korean (e.g., '유사니멀즈', '헬스팩'), you MUST translate it to its official English product name (e.g., 'USANIMALS', 'HEALTHPAK') for the final prompt. The text in the image must ONLY be in English.

Product Ingredients & Environment Mapping (Reference for visuals):
1. BiOmega (바이오메가): Giant fresh sardines, anchovies, and massive sliced lemons with dewy droplets. Crystal clear fish oil pools.
2. HealthPak (헬스팩): A mix of botanicals (broccoli, spinach, grapes, tomatoes, marigold) scattered around the 4 distinct tablets.
3. Proglucamune (프로글루카뮨): Earthy forest floor with giant Shiitake and Reishi mushrooms. Baker's yeast mounds and zinc crystals.
4. CoQuinone (코퀴논): Bright orange and red landscape. Slices of oranges and energy-sparking crystalline textures.
5. Hepasil DTX (헤파실): Large Milk Thistle flowers, artichoke hearts, and green tea leaves.
6. MagneCal D (마그네칼D): Towering white crystalline pillars and sun-dried organic matter.
7. Usanimals (유사니멀즈): Fun, colorful animal-shaped tablets with wild berry textures and natural fruit dyes.

Prompt Construction Rules:
- EXACT ENGLISH BRANDING: MANDATORY - The name "USANA" AND the specific official ENGLISH product name must be precisely and clearly engraved, embossed, or printed on the surface of the giant supplement. Example: "USANA HEALTHPAK".
- LUSH INGREDIENT LANDSCAPE: Surround the giant supplement with its core raw ingredients. Use giant versions of fresh fruits, fish, vegetables, or botanical herbs.
- BUSY MINIATURE POPULATION: Include 20+ tiny 1:25 scale figurines interacting with BOTH the supplement and the raw ingredients.
- DIVERSE WORKFLOW:
  - Groups of workers harvesting juices from giant vegetables.
  - Workers using miniature engraving tools to finalize the product name on the tablet.
  - Tiny quality control agents inspecting the "USANA [PRODUCT_NAME]" branding.
- Visual Quality: Extreme macro photography, shallow depth of field, vibrant colors, 8K resolution.

Constraint: Output ONLY the final English prompt. No Korean characters should be in the prompt.
"#;

/// User instruction for the grounded refinement call.
pub fn research_instruction(request: &GenerationRequest) -> String {
    format!(
        "Search for the 2025 USANA Product Guide and usana.com to find the EXACT shape, color, and coating of \"USANA {name}\". Identify if it is an oblong tablet with speckles, a translucent amber softgel, or a colored coated tablet. Also identify the unique raw ingredients (e.g. sardines/anchovies/lemon for BiOmega, reishi/shiitake for Proglucamune). \n\
         Then create a hyper-realistic miniature workshop prompt where this giant supplement is the central landscape. \n\
         Context: Category={category}, Workers={workers}, Ratio={ratio}.",
        name = request.product_name,
        category = request.category.as_str(),
        workers = request.worker_concept.as_str(),
        ratio = request.aspect_ratio.as_str(),
    )
}

/// Deterministic prompt used when the refinement call returns no text.
/// Keeps the raw (untranslated) product name so the run can still proceed.
pub fn fallback_prompt(product_name: &str) -> String {
    format!(
        "Macro photography of USANA {product_name} as a giant central object, miniature workshop setting, 8K."
    )
}

pub mod messages {
    pub const KEY_INVALID: &str = "API 키 문제가 발생했습니다. 키를 다시 선택해주세요.";
    pub const OVERLOADED: &str = "서버 부하가 심합니다. 잠시 후 다시 시도해 주세요.";
    pub const EMPTY_GENERATION: &str = "이미지가 생성되지 않았습니다.";
    pub const GENERIC: &str = "오류가 발생했습니다.";
}
