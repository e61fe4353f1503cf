fn main() -> Result<(), Box<dyn std::error::Error>> {
    chatbot_playground::cli::main()
}
