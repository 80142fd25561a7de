use crate::format::{truncate_to_budget, PROMPT_TEXT_BUDGET};

pub const SYSTEM_MESSAGE: &str = "You are an expert at extracting business insights from online discussions. You identify pain points, buying intent, and product opportunities. Always respond with valid JSON.";

const ANALYSIS_RULES: &str = "ANALYSIS RULES:
- Only include insights that are DIRECTLY supported by quotes from the thread
- Prioritize comments with high upvotes (score) — these represent validated opinions
- Look for emotional language (frustration, excitement, desperation) — these signal real pain
- Distinguish between \"nice to have\" and \"hair on fire\" problems
- Ignore generic/joke comments";

const RESPONSE_SCHEMA: &str = r#"Provide your analysis in this exact JSON format:

{
    "summary": "2-3 sentences: What is this thread about? What's the overall sentiment?",

    "pain_points": [
        {
            "pain": "Specific, concrete problem (not vague)",
            "severity": "critical | high | medium | low",
            "frequency": "Number of people who mentioned this or similar",
            "who_has_it": "What type of person experiences this problem?",
            "current_solutions": "How are they solving it now (if mentioned)?",
            "why_current_solutions_fail": "Why existing solutions don't work",
            "quotes": ["Exact quote 1", "Exact quote 2"],
            "validation": "Why this is a real problem worth solving"
        }
    ],

    "buying_intent": [
        {
            "signal": "What they explicitly want to pay for",
            "budget_hints": "Any mentions of price, willingness to pay, or budget?",
            "urgency": "high | medium | low — how urgently do they need this?",
            "quotes": ["Exact quote showing intent to pay or buy"]
        }
    ],

    "unmet_needs": [
        {
            "need": "Something people want but explicitly say doesn't exist or is hard to find",
            "who_needs_it": "Target customer profile",
            "why_unmet": "Why hasn't this been solved yet?",
            "opportunity": "Specific product/service idea to fill this gap",
            "quotes": ["Exact quote"]
        }
    ],

    "objections_and_concerns": [
        {
            "objection": "What makes people hesitant or skeptical?",
            "how_to_overcome": "How could a product address this concern?",
            "quotes": ["Exact quote"]
        }
    ],

    "patterns": [
        {
            "pattern": "Recurring theme, behavior, or sentiment",
            "frequency": "How often this appeared",
            "implication": "What this means for product builders"
        }
    ],

    "product_ideas": [
        {
            "idea": "Specific, concrete product or feature idea",
            "target_customer": "Who exactly would buy this?",
            "problem_solved": "Which pain point(s) does this address?",
            "evidence": "Why this would work based on the thread",
            "mvp_suggestion": "Simplest version you could build to test this",
            "risk": "What could go wrong or why this might not work"
        }
    ],

    "golden_quotes": [
        "The most insightful, emotional, or actionable quotes from the thread — these are testimonial gold"
    ],

    "recommended_next_steps": [
        "Specific action item 1 based on this research",
        "Specific action item 2"
    ]
}

IMPORTANT:
- Be SPECIFIC, not generic. "People want better tools" is useless. "3 people said they'd pay $50/month for automated invoice reconciliation" is gold.
- Every insight must have supporting quotes
- Prioritize quality over quantity — only include high-signal insights
- If the thread doesn't have good insights, say so honestly"#;

const PREVIEW_RULES: &str = "ANALYSIS RULES:
- Only include insights DIRECTLY supported by quotes from the thread
- Prioritize high-upvote comments — these are validated opinions
- Look for emotional language (frustration, desperation, excitement) — signals real pain
- Distinguish \"nice to have\" vs \"hair on fire\" problems
- Be SPECIFIC: \"People want better tools\" = useless. \"3 people said they'd pay $50/mo for X\" = gold";

const PREVIEW_SECTIONS: &str = "EXTRACT THE FOLLOWING:

1. PAIN POINTS (for each one include):
   - The specific problem (be concrete, not vague)
   - Severity: critical / high / medium / low
   - How many people mentioned it
   - Who has this problem (customer profile)
   - How they currently solve it & why that fails
   - Exact quotes as evidence

2. BUYING INTENT:
   - What they explicitly want to pay for
   - Any budget/price hints
   - Urgency level
   - Exact quotes showing willingness to pay

3. UNMET NEEDS:
   - Things people want but say don't exist
   - Why it's unmet
   - Product opportunity to fill the gap
   - Exact quotes

4. OBJECTIONS & CONCERNS:
   - What makes people hesitant
   - How a product could overcome this

5. PATTERNS:
   - Recurring themes or behaviors
   - What this means for product builders

6. PRODUCT IDEAS (for each):
   - Specific idea (not vague)
   - Target customer
   - Which pain point it solves
   - MVP suggestion (simplest version to test)
   - Risks / why it might fail

7. GOLDEN QUOTES:
   - The most insightful, emotional, or actionable quotes (testimonial gold)

8. RECOMMENDED NEXT STEPS:
   - 2-3 specific actions based on this research

If the thread lacks good insights, say so honestly. Quality > quantity.";

/// Prompt sent to the model. Asks for the insight JSON object.
pub fn analysis_prompt(formatted: &str, subreddit: &str) -> String {
    format!(
        "You are an expert product researcher. Analyze this Reddit thread from r/{subreddit} to extract precise, actionable insights for someone looking to build products or services.\n\n\
         THREAD DATA:\n{thread}\n\n\
         {ANALYSIS_RULES}\n\n\
         {RESPONSE_SCHEMA}",
        thread = truncate_to_budget(formatted, PROMPT_TEXT_BUDGET),
    )
}

/// Prompt handed back to callers without model access so they can paste it
/// into an assistant of their choice.
pub fn preview_prompt(formatted: &str, subreddit: &str) -> String {
    format!(
        "You are an expert product researcher. Analyze this Reddit thread from r/{subreddit} to extract precise, actionable insights.\n\n\
         THREAD DATA:\n{thread}\n\n\
         {PREVIEW_RULES}\n\n\
         {PREVIEW_SECTIONS}",
        thread = truncate_to_budget(formatted, PROMPT_TEXT_BUDGET),
    )
}
