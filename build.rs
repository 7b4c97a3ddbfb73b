fn main() {
    // Emits ESP-IDF cfg/link directives when the esp32 feature pulls in
    // esp-idf-sys; on a plain host build this produces nothing.
    embuild::espidf::sysenv::output();
}
