mod tests_model_pass;
mod tests_query;
