//! Prompt text for the generator, evaluator and parser.

/// Keys of one generated step.
pub const STEP_KEYS: &[&str] = &["Thought", "Action", "Result"];
/// Keys of one evaluation.
pub const SCORE_KEY: &str = "Final Score";
pub const EVALUATION_KEYS: &[&str] = &[SCORE_KEY, "Hint"];
/// Keys of a parsed problem statement.
pub const PROBLEM_KEYS: &[&str] = &["Prior_Knowledge", "Question", "Domain"];
pub const ANSWER_KEY: &str = "Final Answer";

/// Shown when nothing has been tried outside the current path.
pub const NO_OBSERVATIONS: &str = "There is no observations yet!";

pub const STEP_FORMAT: &str = r#"{
   "Thought": "Short description of the thought",
   "Action": "Text description of the action",
   "Result": "Text description of the result"
}"#;

pub const EVALUATION_FORMAT: &str = r#"{
   "Final Score": Evaluation_Score,
   "Hint": "Improvement hint"
}"#;

pub const PROBLEM_FORMAT: &str = r#"{
   "Prior_Knowledge": "All information from the input in a clear formulation, including numbers, values and relevant details, as the initial state of thinking",
   "Question": "The main question identified in the input",
   "Domain": "The domain of expertise needed to solve the input"
}"#;

pub fn generator_system(domain: &str, problem: &str) -> String {
    format!(
        "You are a careful expert in {domain}. You write step-by-step solutions for hard problems.\n\
         The problem:\n{problem}\n\n\
         Break the problem into a short plan of clear, actionable steps, using as few steps as possible. \
         Each step has a concise thought, an action applying it, and the expected result. \
         Continue from the current reasoning states and answer in this layout for every step:\n\n\
         'Step': the step number\n\
         'Thought': a short description of what should be done next\n\
         'Action': a direct action applying the thought\n\
         'Result': a concise statement of the intermediate or final result\n"
    )
}

pub fn generator_task(
    exclusion_text: &str,
    path_text: &str,
    hint_text: &str,
    step_number: usize,
) -> String {
    format!(
        "These approaches were already tried and did not work out:\n{exclusion_text}\n\n\
         Consider why they failed and decide better. The current situation:\n{path_text}\n\n\
         Which correct actions or different short thoughts come next?\n\n\
         {hint_text}\nThink clearly, keep the math correct and do not skip details.\n\
         We are at Step {step_number}. What are the next moves? Be concise.\n\n\
         Step {step_number}.:\n"
    )
}

pub fn answer_task(problem: &str, steps: &str) -> String {
    format!(
        "These steps were taken to solve the problem:\n{problem}\n\n\
         Steps:\n{steps}\n\n\
         Given the thoughts, actions and results above, what conclusion do they lead to?\n\n\
         Output only your answer:\n\
         {{'{ANSWER_KEY}': answer}}\n"
    )
}

pub fn evaluator_system(domain: &str) -> String {
    format!(
        "You are an expert in {domain} judging how effective one solution step is for the given problem. \
         Give a score from 0 (ineffective) to 100 (highly effective), judging logical coherence, \
         fit with the problem requirements and impact on the solution.\n\n\
         A step can look right while a step before it is missing, or the thought can be right while the \
         result is wrong.\n\
         Answer as follows:\n\
         '{SCORE_KEY}': score\n\
         'Hint': rethink the step and briefly suggest a better step or a correction (recalculate); \
         if the step is correct, confirm it.\n\
         The step may be an intermediate one building on earlier steps. Keep the answer short."
    )
}

pub fn evaluator_task(problem: &str, path_text: &str, candidate_text: &str) -> String {
    format!(
        "Problem:\n{problem}\n\n\
         Previous steps:\n{path_text}\n\n\
         Evaluate this step:\n{candidate_text}\n\n\
         How effective is this step for solving the problem? Give a score and a brief hint."
    )
}

pub fn parser_system(format: &str) -> String {
    format!(
        "Your role is to format text into structured JSON.\n\
         Format the output as a JSON object as follows:\n{format}"
    )
}

pub fn parser_task(input: &str) -> String {
    format!("Parse this input:\n{input}\n\n")
}
