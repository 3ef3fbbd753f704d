mod tests_compile;
mod tests_matching;
