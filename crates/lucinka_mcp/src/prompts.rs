use rmcp::model::{GetPromptResult, PromptMessage, PromptMessageRole};

pub fn daily_report_prompt(date: &str) -> GetPromptResult {
    GetPromptResult::new(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Write a short daily report for {}.\n\nInclude:\n1. Sleep: total time and the longest stretch\n2. Feedings: number of sessions, minutes per side and when the last one ended\n3. Other activities (tummy time, walks, custom types) with their durations\n4. Doctor visits, if any\n5. Anything unusual compared with the rest of the week\n\nUse get_activity_statistics for today/week totals, list_sessions_by_day for the individual sessions, get_feeding_summary for feeding details and get_growth_chart if a new weight was recorded. Keep it friendly and concise.",
                date
            ),
        )])
    .with_description(format!("Daily baby report for {}", date))
}

pub fn growth_check_prompt(birth_date: &str) -> GetPromptResult {
    GetPromptResult::new(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Review the baby's growth since birth ({}).\n\nUse get_growth_chart and describe:\n1. Current age in months and the latest weight\n2. Which percentile band the weight falls into and whether it is stable\n3. Weight change since birth and since the previous measurement\n\nDo not give medical advice; suggest asking the pediatrician if the curve crosses bands.",
                birth_date
            ),
        )])
    .with_description("Growth check against the reference percentiles".to_string())
}
